//! The Line Parser.
//!
//! Wire format: `<path> <value> <timestamp>\n`, one sample per line.
//! `parse_line`/`parse_payload` return `Result` rather than raising, so a
//! malformed line is ordinary control flow for every caller.

use tsdb_core::{ParseError, Sample};

/// Parse one line (no embedded newline) into a `Sample`.
pub fn parse_line(line: &str) -> Result<Sample, ParseError> {
    if line.is_empty() {
        return Err(ParseError::EmptyLine);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(ParseError::WrongTokenCount {
            found: parts.len(),
            line: line.to_string(),
        });
    }

    let path = parts[0];
    let value = parse_finite_f64(parts[1], "value", line)?;
    let timestamp = parse_finite_f64(parts[2], "timestamp", line)?;

    Ok(Sample::new(path, timestamp, value))
}

fn parse_finite_f64(token: &str, field: &'static str, line: &str) -> Result<f64, ParseError> {
    let v: f64 = token
        .parse()
        .map_err(|_| ParseError::BadNumber {
            field,
            line: line.to_string(),
        })?;
    if !v.is_finite() {
        return Err(ParseError::BadNumber {
            field,
            line: line.to_string(),
        });
    }
    Ok(v)
}

/// Parse a whole request payload (one UDP datagram or one TCP connection's
/// full body) into its samples.
///
/// Whole-payload atomicity: a parse error anywhere in the payload rejects
/// the entire payload — no partial results are returned. `str::lines()`
/// already drops a genuine trailing newline without yielding an empty
/// element, so any empty line this sees is a real blank line and fails like
/// any other malformed line.
pub fn parse_payload(payload: &[u8]) -> Result<Vec<Sample>, ParseError> {
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::NotUtf8)?;

    let mut samples = Vec::new();
    for line in text.lines() {
        samples.push(parse_line(line)?);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let s = parse_line("one 1 2").unwrap();
        assert_eq!(s.path, "one");
        assert_eq!(s.value, 1.0);
        assert_eq!(s.timestamp, 2.0);
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert!(matches!(
            parse_line("one 1"),
            Err(ParseError::WrongTokenCount { found: 2, .. })
        ));
        assert!(matches!(
            parse_line("one 1 2 3"),
            Err(ParseError::WrongTokenCount { found: 4, .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_and_non_finite() {
        assert!(parse_line("one x 2").is_err());
        assert!(parse_line("one 1 nan").is_err());
        assert!(parse_line("one inf 2").is_err());
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(parse_line(""), Err(ParseError::EmptyLine));
    }

    #[test]
    fn payload_atomicity_rejects_whole_batch_on_one_bad_line() {
        let err = parse_payload(b"ok 1 1\ngarbage line\n");
        assert!(err.is_err());
    }

    #[test]
    fn payload_splits_multiple_lines_and_tolerates_trailing_newline() {
        let samples = parse_payload(b"one 1 1\none 5 2\ntwo 2 5\n").unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].path, "two");
    }

    #[test]
    fn payload_rejects_whole_batch_on_embedded_blank_line() {
        let err = parse_payload(b"one 1 1\n\ntwo 2 2\n");
        assert_eq!(err, Err(ParseError::EmptyLine));
    }

    #[test]
    fn payload_rejects_non_utf8() {
        assert_eq!(parse_payload(&[0xff, 0xfe, 0xfd]), Err(ParseError::NotUtf8));
    }

    proptest::proptest! {
        #[test]
        fn round_trip_preserves_finite_samples(
            path in "[a-zA-Z][a-zA-Z0-9_.]{0,15}",
            value in -1.0e6f64..1.0e6,
            timestamp in 0.0f64..1.0e10,
        ) {
            let line = format!("{path} {value} {timestamp}");
            let sample = parse_line(&line).unwrap();
            proptest::prop_assert_eq!(sample.path, path);
            proptest::prop_assert_eq!(sample.value, value);
            proptest::prop_assert_eq!(sample.timestamp, timestamp);
        }
    }
}
