//! The fixed period ladder and the fixed stat set.

use std::fmt;

use crate::errors::ArgumentError;

/// One entry of the period ladder. The variant order is the ladder order —
/// it matters for list/union outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneSecond,
    TenSecond,
    OneMinute,
    FiveMinute,
    OneHour,
    OneDay,
}

/// The period ladder in order, leaf-to-longest. The set is closed: no
/// runtime extension.
pub const PERIODS: [Period; 6] = [
    Period::OneSecond,
    Period::TenSecond,
    Period::OneMinute,
    Period::FiveMinute,
    Period::OneHour,
    Period::OneDay,
];

impl Period {
    /// The period's length in seconds.
    pub const fn seconds(self) -> i64 {
        match self {
            Period::OneSecond => 1,
            Period::TenSecond => 10,
            Period::OneMinute => 60,
            Period::FiveMinute => 300,
            Period::OneHour => 3600,
            Period::OneDay => 86400,
        }
    }

    /// The name used as the rollup table name and in the Query API.
    pub const fn name(self) -> &'static str {
        match self {
            Period::OneSecond => "onesecond",
            Period::TenSecond => "tensecond",
            Period::OneMinute => "oneminute",
            Period::FiveMinute => "fiveminute",
            Period::OneHour => "onehour",
            Period::OneDay => "oneday",
        }
    }

    /// The largest period in the ladder, used by the retention horizon.
    pub fn max_seconds() -> i64 {
        PERIODS.iter().map(|p| p.seconds()).max().unwrap()
    }

    pub fn from_name(name: &str) -> Result<Period, ArgumentError> {
        PERIODS
            .iter()
            .copied()
            .find(|p| p.name() == name)
            .ok_or_else(|| ArgumentError::InvalidPeriod {
                given: name.to_string(),
            })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed stat set. Order matches the column order of a rollup row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    N,
    Min,
    Max,
    Avg,
    Sum,
    P50,
    P90,
    P99,
}

pub const STATS: [Stat; 8] = [
    Stat::N,
    Stat::Min,
    Stat::Max,
    Stat::Avg,
    Stat::Sum,
    Stat::P50,
    Stat::P90,
    Stat::P99,
];

impl Stat {
    pub const fn column(self) -> &'static str {
        match self {
            Stat::N => "n",
            Stat::Min => "min",
            Stat::Max => "max",
            Stat::Avg => "avg",
            Stat::Sum => "sum",
            Stat::P50 => "p50",
            Stat::P90 => "p90",
            Stat::P99 => "p99",
        }
    }

    pub fn from_name(name: &str) -> Result<Stat, ArgumentError> {
        STATS
            .iter()
            .copied()
            .find(|s| s.column() == name)
            .ok_or_else(|| ArgumentError::InvalidStat {
                given: name.to_string(),
            })
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_order_matches_seconds_order() {
        let seconds: Vec<i64> = PERIODS.iter().map(|p| p.seconds()).collect();
        let mut sorted = seconds.clone();
        sorted.sort();
        assert_eq!(seconds, sorted);
    }

    #[test]
    fn max_seconds_is_one_day() {
        assert_eq!(Period::max_seconds(), 86_400);
    }

    #[test]
    fn from_name_round_trips() {
        for p in PERIODS {
            assert_eq!(Period::from_name(p.name()).unwrap(), p);
        }
        assert!(Period::from_name("bogus").is_err());
    }

    #[test]
    fn stat_from_name_round_trips() {
        for s in STATS {
            assert_eq!(Stat::from_name(s.column()).unwrap(), s);
        }
        assert!(Stat::from_name("p100").is_err());
    }
}
