//! Metric filter + value extractor.

use crate::parse::{parse_int, ParseFailure, ParsedRecord};

/// Three distinct outcomes, never conflated through a sentinel:
///
/// - `Ok(Some(v))`  metric matches the target and the value is an integer;
///   `v` may legitimately be -1.
/// - `Ok(None)`     metric does not match; the line is filtered out.
/// - `Err(InvalidValue)`  metric matches but the value is not an integer.
pub fn extract(record: &ParsedRecord, target: &[u8]) -> Result<Option<i64>, ParseFailure> {
    if record.metric != target {
        return Ok(None);
    }
    parse_int(record.value)
        .map(Some)
        .ok_or(ParseFailure::InvalidValue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{LineParser, SplitParser};

    fn record(line: &[u8]) -> ParsedRecord<'_> {
        SplitParser.parse(line).unwrap()
    }

    #[test]
    fn matching_metric_yields_value() {
        assert_eq!(extract(&record(b"100,cpu_usage,42"), b"cpu_usage"), Ok(Some(42)));
    }

    #[test]
    fn other_metric_is_filtered_not_failed() {
        assert_eq!(extract(&record(b"200,mem_usage,99"), b"cpu_usage"), Ok(None));
    }

    #[test]
    fn literal_minus_one_is_a_real_observation() {
        assert_eq!(extract(&record(b"300,cpu_usage,-1"), b"cpu_usage"), Ok(Some(-1)));
    }

    #[test]
    fn bad_value_on_matching_metric_is_invalid() {
        assert_eq!(
            extract(&record(b"300,cpu_usage,forty-two"), b"cpu_usage"),
            Err(ParseFailure::InvalidValue)
        );
        // Same bad value on a non-matching metric is merely filtered.
        assert_eq!(extract(&record(b"300,mem_usage,forty-two"), b"cpu_usage"), Ok(None));
    }
}
