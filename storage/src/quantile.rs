//! The `quantile(value, q)` user-defined aggregate.
//!
//! Accumulates the group's values in memory; on finalize, sorts and returns
//! the linear-interpolation percentile at `q * 100`, matching numpy's
//! default `linear` method without a numpy-equivalent dependency. `q` must
//! be constant across one group; a change mid-group surfaces as
//! `StorageError::QuantileGroupChanged` rather than a panic.

use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::Connection;
use tsdb_core::StorageError;

#[derive(Default)]
pub struct QuantileState {
    values: Vec<f64>,
    q: Option<f64>,
}

#[derive(Debug)]
struct QuantileGroupChanged;

impl std::fmt::Display for QuantileGroupChanged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "quantile() called with a changing q within one group")
    }
}

impl std::error::Error for QuantileGroupChanged {}

/// `step()` boxes a [`QuantileGroupChanged`] inside `rusqlite::Error::UserFunctionError`;
/// this recognizes that shape so callers can surface `StorageError::QuantileGroupChanged`
/// instead of the generic `SqliteError` the blanket conversion would otherwise produce.
pub(crate) fn is_quantile_group_changed(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::UserFunctionError(boxed) if boxed.downcast_ref::<QuantileGroupChanged>().is_some()
    )
}

pub struct Quantile;

impl Aggregate<QuantileState, Option<f64>> for Quantile {
    fn init(&self, _ctx: &mut Context<'_>) -> rusqlite::Result<QuantileState> {
        Ok(QuantileState::default())
    }

    fn step(&self, ctx: &mut Context<'_>, state: &mut QuantileState) -> rusqlite::Result<()> {
        let value: f64 = ctx.get(0)?;
        let q: f64 = ctx.get(1)?;

        match state.q {
            None => state.q = Some(q),
            Some(existing) if (existing - q).abs() > f64::EPSILON => {
                return Err(rusqlite::Error::UserFunctionError(Box::new(
                    QuantileGroupChanged,
                )));
            }
            _ => {}
        }
        state.values.push(value);
        Ok(())
    }

    fn finalize(
        &self,
        _ctx: &mut Context<'_>,
        state: Option<QuantileState>,
    ) -> rusqlite::Result<Option<f64>> {
        let Some(mut state) = state else {
            return Ok(None);
        };
        let Some(q) = state.q else {
            return Ok(None);
        };
        Ok(Some(linear_interpolation_percentile(&mut state.values, q)))
    }
}

/// Linear-interpolation percentile at `q * 100`, matching numpy's default
/// `linear` method: rank `r = q * (n - 1)`, interpolate between the values
/// at `floor(r)` and `ceil(r)`.
pub fn linear_interpolation_percentile(values: &mut [f64], q: f64) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).expect("non-finite value in quantile group"));
    let n = values.len();
    if n == 1 {
        return values[0];
    }
    let rank = q * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return values[lo];
    }
    let frac = rank - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}

pub fn register_quantile(conn: &Connection) -> Result<(), StorageError> {
    conn.create_aggregate_function(
        "quantile",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        Quantile,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_like_numpy_linear() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        // p50 of [1,2,3,4,5] is the middle value, 3.0.
        assert_eq!(linear_interpolation_percentile(&mut values, 0.5), 3.0);
    }

    #[test]
    fn interpolates_between_ranks_for_even_count() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0];
        // rank = 0.5 * 3 = 1.5 -> interpolate between values[1]=2 and values[2]=3
        assert_eq!(linear_interpolation_percentile(&mut values, 0.5), 2.5);
    }

    #[test]
    fn single_value_returns_itself_for_any_q() {
        let mut values = vec![7.0];
        assert_eq!(linear_interpolation_percentile(&mut values, 0.99), 7.0);
    }

    #[test]
    fn registers_and_computes_via_sql() {
        let conn = Connection::open_in_memory().unwrap();
        register_quantile(&conn).unwrap();
        conn.execute_batch("CREATE TABLE t (g TEXT, v REAL);").unwrap();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            conn.execute("INSERT INTO t VALUES ('a', ?1)", [v]).unwrap();
        }
        let p50: f64 = conn
            .query_row("SELECT quantile(v, 0.5) FROM t GROUP BY g", [], |r| r.get(0))
            .unwrap();
        assert_eq!(p50, 3.0);
    }
}
