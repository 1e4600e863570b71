//! The interval algebra: a pure function deciding which rollup buckets are
//! final (safe to write) and which are partial (intentionally not written
//! in this design).

/// `(final_start, final_end)` and `(partial_start, partial_end)`, both
/// half-open `[start, end)`. `last_final` is the largest rollup `timestamp`
/// already written for this `(period, path)`, or `None` if no rollup row
/// exists yet.
pub fn intervals(
    period_seconds: i64,
    tail_seconds: i64,
    now: f64,
    last_final: Option<f64>,
) -> ((f64, f64), (f64, f64)) {
    let p = period_seconds as f64;
    let t = tail_seconds as f64;
    let last_final = last_final.unwrap_or(-p);

    let final_start = last_final + p;
    let final_end = ((now - t) / p).floor() * p;

    let partial_start = final_end;
    let partial_end = ((now / p).floor() + 1.0) * p;

    ((final_start, final_end), (partial_start, partial_end))
}

/// Whether the final interval is non-empty and worth writing: if
/// `final_start >= final_end` there is nothing new to finalize yet.
pub fn final_is_nonempty(final_start: f64, final_end: f64) -> bool {
    final_start < final_end
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hand-worked cases covering both periods and every last_final shape.
    #[test]
    fn exact_table_cases() {
        let cases: &[(i64, i64, f64, Option<f64>, (f64, f64), (f64, f64))] = &[
            (10, 30, 102.0, Some(30.0), (40.0, 70.0), (70.0, 110.0)),
            (10, 30, 102.0, Some(50.0), (60.0, 70.0), (70.0, 110.0)),
            (10, 30, 102.0, Some(60.0), (70.0, 70.0), (70.0, 110.0)),
            (10, 30, 110.0, Some(60.0), (70.0, 80.0), (80.0, 120.0)),
            (60, 30, 102.0, Some(0.0), (60.0, 60.0), (60.0, 120.0)),
            (60, 30, 150.0, Some(0.0), (60.0, 120.0), (120.0, 180.0)),
        ];

        for &(p, t, now, last_final, expected_final, expected_partial) in cases {
            let (final_iv, partial_iv) = intervals(p, t, now, last_final);
            assert_eq!(final_iv, expected_final, "final interval for {p},{t},{now},{last_final:?}");
            assert_eq!(partial_iv, expected_partial, "partial interval for {p},{t},{now},{last_final:?}");
        }
    }

    #[test]
    fn no_last_final_uses_negative_period_sentinel() {
        let ((final_start, _), _) = intervals(10, 30, 102.0, None);
        // last_final := -P, so final_start = -P + P = 0.
        assert_eq!(final_start, 0.0);
    }

    #[test]
    fn empty_final_interval_is_detected() {
        let ((fs, fe), _) = intervals(10, 30, 102.0, Some(60.0));
        assert!(!final_is_nonempty(fs, fe));
        let ((fs, fe), _) = intervals(10, 30, 110.0, Some(60.0));
        assert!(final_is_nonempty(fs, fe));
    }

    proptest::proptest! {
        #[test]
        fn partial_always_starts_where_final_ends(
            p in 1i64..100_000,
            t in 0i64..100_000,
            now in 0.0f64..1.0e9,
        ) {
            let ((_, final_end), (partial_start, _)) = intervals(p, t, now, None);
            proptest::prop_assert_eq!(final_end, partial_start);
        }

        #[test]
        fn final_end_is_monotonic_in_now(
            p in 1i64..1000,
            t in 0i64..1000,
            now1 in 0.0f64..1.0e6,
            delta in 0.0f64..1.0e6,
        ) {
            let now2 = now1 + delta;
            let ((_, fe1), _) = intervals(p, t, now1, None);
            let ((_, fe2), _) = intervals(p, t, now2, None);
            proptest::prop_assert!(fe2 >= fe1);
        }
    }
}
