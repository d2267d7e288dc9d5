//! Numeric value extraction from LLM responses.
//!
//! [`parse_number`] handles answers like "Score: 8.5", "8/10" and numbers
//! buried in prose; [`parse_number_in_range`] adds inclusive bounds.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use tracing::debug;

use crate::config::ParserConfig;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::preprocess_with;
use crate::parser::OutputParser;
use crate::prompt;

const LABELS: [&str; 3] = ["score:", "rating:", "result:"];

/// Extract a numeric value from an LLM response.
///
/// Strategies (in order):
/// - the whole answer: `"8.5"`
/// - the first number after a label: `"Score: 8.5"`, `"Rating: 8"`
/// - the numerator of a fraction: `"8/10"`
/// - the last number in the text: `"I'd rate it 7.5"`
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::parse_number;
///
/// let score: f64 = parse_number("Score: 8.5").unwrap();
/// assert!((score - 8.5).abs() < f64::EPSILON);
/// ```
pub fn parse_number<T: FromStr>(response: &str) -> Result<T, ParseError> {
    number_with(response, &ParserConfig::default())
}

/// Extract a number and verify it falls within `[min, max]` inclusive.
///
/// ```
/// use llm_output_parser::output_parser::{parse_number_in_range, ParseError};
///
/// let score: i32 = parse_number_in_range("8", 1, 10).unwrap();
/// assert_eq!(score, 8);
/// assert!(matches!(
///     parse_number_in_range::<i32>("15", 1, 10),
///     Err(ParseError::OutOfRange { .. })
/// ));
/// ```
pub fn parse_number_in_range<T>(response: &str, min: T, max: T) -> Result<T, ParseError>
where
    T: FromStr + PartialOrd + Display,
{
    let value = parse_number::<T>(response)?;
    check_range(value, &min, &max, response)
}

fn check_range<T: PartialOrd + Display>(
    value: T,
    min: &T,
    max: &T,
    raw: &str,
) -> Result<T, ParseError> {
    // NaN is unordered, so test inclusion rather than exclusion.
    if !(value >= *min && value <= *max) {
        debug!(%value, %min, %max, "number out of range");
        return Err(ParseError::OutOfRange {
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            raw: raw.to_string(),
        });
    }
    Ok(value)
}

fn number_with<T: FromStr>(response: &str, config: &ParserConfig) -> Result<T, ParseError> {
    let cleaned = preprocess_with(response, config);
    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }

    if let Ok(value) = cleaned.parse::<T>() {
        return Ok(value);
    }

    let lower = cleaned.to_lowercase();
    for label in LABELS {
        // Lowercasing can shift byte offsets outside ASCII, so search the
        // lowered text and slice the same text.
        if let Some(pos) = lower.find(label) {
            let after = &lower[pos + label.len()..];
            if let Some(value) = numbers(after).first().and_then(|n| n.parse::<T>().ok()) {
                return Ok(value);
            }
        }
    }

    if let Some(value) = fraction_numerator(&cleaned) {
        return Ok(value);
    }

    if let Some(value) = numbers(&cleaned).iter().rev().find_map(|n| n.parse::<T>().ok()) {
        return Ok(value);
    }

    debug!("no number found in response");
    Err(ParseError::NoNumber {
        raw: response.to_string(),
    })
}

/// The numerator of the first `N/M` pattern that parses as `T`.
fn fraction_numerator<T: FromStr>(text: &str) -> Option<T> {
    text.match_indices('/').find_map(|(slash, _)| {
        let head = &text[..slash];
        let prefix = head.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-');
        let numerator = &head[prefix.len()..];
        let denominator_follows = text[slash + 1..].starts_with(|c: char| c.is_ascii_digit());
        if numerator.is_empty() || !denominator_follows {
            return None;
        }
        numerator.parse().ok()
    })
}

/// Number-like spans: optional leading minus, digits, optional fraction.
fn numbers(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let negative = bytes[i] == b'-' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
        if !(negative || bytes[i].is_ascii_digit()) {
            i += 1;
            continue;
        }
        let start = i;
        if negative {
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        spans.push(&text[start..i]);
    }

    spans
}

/// An [`OutputParser`] extracting a number, optionally bounded.
///
/// ```
/// use llm_output_parser::{NumberParser, OutputParser};
///
/// let parser = NumberParser::new().with_range(1u8, 10);
/// assert_eq!(parser.parse("I'd say 7/10").unwrap(), 7);
/// assert!(parser.parse("11").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct NumberParser<T> {
    range: Option<(T, T)>,
    config: ParserConfig,
    _output: PhantomData<fn() -> T>,
}

impl<T> NumberParser<T> {
    pub fn new() -> Self {
        Self {
            range: None,
            config: ParserConfig::default(),
            _output: PhantomData,
        }
    }

    /// Reject values outside `[min, max]`.
    pub fn with_range(mut self, min: T, max: T) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl<T: Display> NumberParser<T> {
    pub fn format_instructions(&self) -> String {
        match &self.range {
            Some((min, max)) => format!(
                "Answer with a single number between {min} and {max} (inclusive), and nothing else."
            ),
            None => "Answer with a single number, and nothing else.".to_string(),
        }
    }
}

impl<T> Default for NumberParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutputParser for NumberParser<T>
where
    T: FromStr + PartialOrd + Display,
{
    type Output = T;

    fn parse(&self, output: &str) -> Result<T, ParseError> {
        let value = number_with::<T>(output, &self.config)?;
        match &self.range {
            Some((min, max)) => check_range(value, min, max, output),
            None => Ok(value),
        }
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}
