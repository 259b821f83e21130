//! Line parsing, two interchangeable strategies behind one trait.

use bstr::ByteSlice;
use regex::bytes::Regex;

const COMMA: u8 = 44;
const MINUS: u8 = 45;

const LOG_LINE_PATTERN: &str = "^(.*?),(.*?),(.*)$";

/// One log record, borrowing the line buffer it was split from.
///
/// A line qualifies only if it splits on its first two commas into an integer
/// timestamp, a metric name and a value field. The value keeps any further
/// commas verbatim and has trailing whitespace trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRecord<'a> {
    pub timestamp: i64,
    pub metric: &'a [u8],
    pub value: &'a [u8],
}

/// Per-line rejection kinds. Recoverable: the pipeline counts the line and
/// moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("line does not split into timestamp,metric,value")]
    MalformedLine,
    #[error("value field is not a base-10 integer")]
    InvalidValue,
}

pub trait LineParser {
    fn parse<'a>(&self, line: &'a [u8]) -> Result<ParsedRecord<'a>, ParseFailure>;
}

impl<P: LineParser + ?Sized> LineParser for &P {
    fn parse<'a>(&self, line: &'a [u8]) -> Result<ParsedRecord<'a>, ParseFailure> {
        (**self).parse(line)
    }
}

/// Regex-backed strategy. The pattern is compiled once at construction and
/// shared read-only across every line.
#[derive(Debug, Clone)]
pub struct PatternParser {
    re: Regex,
    require_utf8: bool,
}

impl PatternParser {
    pub fn new() -> Self {
        Self {
            re: Regex::new(LOG_LINE_PATTERN).expect("hardcoded pattern compiles"),
            require_utf8: false,
        }
    }

    /// Text mode: lines must be valid UTF-8 before matching.
    pub fn utf8() -> Self {
        Self { require_utf8: true, ..Self::new() }
    }
}

impl Default for PatternParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser for PatternParser {
    fn parse<'a>(&self, line: &'a [u8]) -> Result<ParsedRecord<'a>, ParseFailure> {
        if self.require_utf8 && std::str::from_utf8(line).is_err() {
            return Err(ParseFailure::MalformedLine);
        }
        let caps = self.re.captures(line).ok_or(ParseFailure::MalformedLine)?;
        let timestamp = caps
            .get(1)
            .and_then(| group | parse_int(group.as_bytes()))
            .ok_or(ParseFailure::MalformedLine)?;
        let metric = caps.get(2).ok_or(ParseFailure::MalformedLine)?.as_bytes();
        let value = caps.get(3).ok_or(ParseFailure::MalformedLine)?.as_bytes();
        Ok(ParsedRecord { timestamp, metric, value: value.trim_end() })
    }
}

/// Manual scan for the first two comma offsets. The high-throughput path;
/// field boundaries match `PatternParser` byte for byte on any line with at
/// least two commas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitParser;

impl LineParser for SplitParser {
    fn parse<'a>(&self, line: &'a [u8]) -> Result<ParsedRecord<'a>, ParseFailure> {
        let first = line
            .iter()
            .position(| &byte | byte == COMMA)
            .ok_or(ParseFailure::MalformedLine)?;
        let second = line[first + 1..]
            .iter()
            .position(| &byte | byte == COMMA)
            .map(| offset | first + 1 + offset)
            .ok_or(ParseFailure::MalformedLine)?;

        let timestamp = parse_int(&line[..first]).ok_or(ParseFailure::MalformedLine)?;
        Ok(ParsedRecord {
            timestamp,
            metric: &line[first + 1..second],
            value: line[second + 1..].trim_end(),
        })
    }
}

/// Strict base-10 parse: optional leading minus, at least one digit, nothing
/// else, overflow rejected.
pub(crate) fn parse_int(buffer: &[u8]) -> Option<i64> {
    let (digits, is_neg) = match buffer.split_first() {
        Some((&MINUS, rest)) => (rest, true),
        _ => (buffer, false),
    };
    if digits.is_empty() {
        return None;
    }

    let mut acc: i64 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return None;
        }
        acc = acc
            .checked_mul(10)?
            .checked_add(i64::from(byte - b'0'))?;
    }

    match is_neg {
        true => Some(-acc),
        false => Some(acc),
    }
}
