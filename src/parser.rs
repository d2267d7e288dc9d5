//! The output parser capability.
//!
//! An [`OutputParser`] does two things: it turns raw model text into a
//! structured value, correcting what it can on the way, and it augments a
//! query with instructions that steer the model toward text it can parse.
//! Any type providing both operations is a parser; the built-in ones live
//! in [`output_parser`](crate::output_parser).

use std::marker::PhantomData;
use std::sync::Arc;

use crate::output_parser::ParseError;
use crate::prompt;
use crate::response::ResponseText;
use crate::ParserConfig;

/// Parse structured output from model text and format queries for it.
///
/// Implementations should be cheap to call repeatedly and must not rely on
/// hidden mutable state: both operations take `&self`. `format` never fails
/// and returns a new string.
///
/// # Example
///
/// ```
/// use llm_output_parser::{OutputParser, ParseError};
///
/// struct YesNo;
///
/// impl OutputParser for YesNo {
///     type Output = bool;
///
///     fn parse(&self, output: &str) -> Result<bool, ParseError> {
///         match output.trim().to_lowercase().as_str() {
///             "yes" => Ok(true),
///             "no" => Ok(false),
///             _ => Err(ParseError::custom("expected yes or no", output)),
///         }
///     }
///
///     fn format(&self, query: &str) -> String {
///         format!("{query}\n\nAnswer yes or no.")
///     }
/// }
///
/// assert!(YesNo.parse(" Yes ").unwrap());
/// assert!(YesNo.parse("maybe").is_err());
/// ```
pub trait OutputParser {
    /// The structured value produced by [`parse`](OutputParser::parse).
    type Output;

    /// Parse, validate, and correct raw model output.
    fn parse(&self, output: &str) -> Result<Self::Output, ParseError>;

    /// Augment a query with formatting instructions for this parser.
    fn format(&self, query: &str) -> String;

    /// Drain a response (complete or streamed) and parse the full text.
    fn parse_response(&self, response: ResponseText) -> Result<Self::Output, ParseError> {
        let text = response.into_text();
        self.parse(&text)
    }
}

/// A thread-safe, type-erased parser.
pub type SharedOutputParser<O> = Arc<dyn OutputParser<Output = O> + Send + Sync>;

impl<P: OutputParser + ?Sized> OutputParser for &P {
    type Output = P::Output;

    fn parse(&self, output: &str) -> Result<Self::Output, ParseError> {
        (**self).parse(output)
    }

    fn format(&self, query: &str) -> String {
        (**self).format(query)
    }
}

impl<P: OutputParser + ?Sized> OutputParser for Box<P> {
    type Output = P::Output;

    fn parse(&self, output: &str) -> Result<Self::Output, ParseError> {
        (**self).parse(output)
    }

    fn format(&self, query: &str) -> String {
        (**self).format(query)
    }
}

impl<P: OutputParser + ?Sized> OutputParser for Arc<P> {
    type Output = P::Output;

    fn parse(&self, output: &str) -> Result<Self::Output, ParseError> {
        (**self).parse(output)
    }

    fn format(&self, query: &str) -> String {
        (**self).format(query)
    }
}

/// A parser backed by a closure.
///
/// Closure errors become [`ParseError::Custom`] carrying the full error
/// chain and the raw output. Without instructions, `format` returns the
/// query unchanged.
///
/// ```
/// use llm_output_parser::{FnParser, OutputParser};
///
/// let words = FnParser::new(|text: &str| -> anyhow::Result<usize> {
///     let count = text.split_whitespace().count();
///     anyhow::ensure!(count > 0, "no words");
///     Ok(count)
/// })
/// .with_instructions("Answer in a few words.");
///
/// assert_eq!(words.parse("three short words").unwrap(), 3);
/// assert!(words.format("Describe Rust.").ends_with("Answer in a few words."));
/// ```
pub struct FnParser<F, T> {
    parse_fn: F,
    instructions: Option<String>,
    config: ParserConfig,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FnParser<F, T>
where
    F: Fn(&str) -> anyhow::Result<T>,
{
    pub fn new(parse_fn: F) -> Self {
        Self {
            parse_fn,
            instructions: None,
            config: ParserConfig::default(),
            _output: PhantomData,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl<F, T> OutputParser for FnParser<F, T>
where
    F: Fn(&str) -> anyhow::Result<T>,
{
    type Output = T;

    fn parse(&self, output: &str) -> Result<T, ParseError> {
        (self.parse_fn)(output).map_err(|err| ParseError::custom(format!("{err:#}"), output))
    }

    fn format(&self, query: &str) -> String {
        match &self.instructions {
            Some(instructions) => prompt::append_instructions(query, instructions, &self.config),
            None => query.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_parser::{
        ChoiceParser, JsonParser, ListParser, NumberParser, TextParser, XmlTagParser,
    };
    use serde_json::{json, Value};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn builtin_parsers_are_thread_safe() {
        assert_send_sync::<JsonParser<Value>>();
        assert_send_sync::<ListParser>();
        assert_send_sync::<ChoiceParser>();
        assert_send_sync::<NumberParser<f64>>();
        assert_send_sync::<XmlTagParser>();
        assert_send_sync::<TextParser>();
    }

    #[test]
    fn shared_parser_is_usable_across_threads() {
        let parser: SharedOutputParser<Value> = Arc::new(JsonParser::<Value>::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let parser = Arc::clone(&parser);
                std::thread::spawn(move || parser.parse(&format!("{{\"n\": {i}}}")).unwrap())
            })
            .collect();
        let mut seen: Vec<i64> = handles
            .into_iter()
            .map(|h| h.join().unwrap()["n"].as_i64().unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn json_round_trip() {
        let parser = JsonParser::<Value>::new();
        let values = [
            json!({"a": 1, "nested": {"list": [1, 2, 3], "flag": true}}),
            json!(["x", "y"]),
            json!({"text": "quotes \" and braces { } inside"}),
        ];
        for value in values {
            let serialized = serde_json::to_string(&value).unwrap();
            assert_eq!(parser.parse(&serialized).unwrap(), value);
        }
    }

    #[test]
    fn list_round_trip() {
        let parser = ListParser::raw();
        let items = vec!["Alpha".to_string(), "beta gamma".to_string()];
        let serialized = serde_json::to_string(&items).unwrap();
        assert_eq!(parser.parse(&serialized).unwrap(), items);
    }

    #[test]
    fn uncorrectable_input_is_a_parse_error() {
        let json = JsonParser::<Value>::new();
        let err = json.parse("no structure here at all").unwrap_err();
        assert_eq!(err.kind(), "unparseable output");
        assert_eq!(err.raw_output(), "no structure here at all");

        let number = NumberParser::<i32>::new();
        assert!(matches!(number.parse("none"), Err(ParseError::NoNumber { .. })));
    }

    #[test]
    fn lenient_json_corrects_unquoted_keys() {
        let parser = JsonParser::<Value>::new();
        assert_eq!(parser.parse(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parser.parse("{a: 1}").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn strict_json_rejects_unquoted_keys() {
        let parser = JsonParser::<Value>::new().with_config(ParserConfig::strict());
        let err = parser.parse("{a: 1}").unwrap_err();
        assert!(matches!(err, ParseError::DeserializationFailed { .. }));
        assert_eq!(err.raw_output(), "{a: 1}");
    }

    #[test]
    fn format_is_non_empty_and_pure() {
        let parsers: Vec<Box<dyn Fn(&str) -> String>> = vec![
            Box::new(|q: &str| JsonParser::<Value>::new().format(q)),
            Box::new(|q: &str| ListParser::tags().format(q)),
            Box::new(|q: &str| ChoiceParser::new(["yes", "no"]).format(q)),
            Box::new(|q: &str| NumberParser::<f64>::new().format(q)),
            Box::new(|q: &str| XmlTagParser::new("answer").format(q)),
            Box::new(|q: &str| TextParser::new().format(q)),
        ];
        let query = String::from("What is the capital of France?");
        for format in &parsers {
            let first = format(&query);
            let second = format(&query);
            assert!(!first.is_empty());
            assert_eq!(first, second);
            assert!(first.starts_with(&query));
            assert!(first.len() > query.len());
        }
        assert_eq!(query, "What is the capital of France?");
    }

    #[test]
    fn parse_response_drains_tokens() {
        let parser = JsonParser::<Value>::new();
        let response = ResponseText::from_tokens(
            ["<think>plan</think>", "{\"a\"", ": [1, ", "2]}"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(parser.parse_response(response).unwrap(), json!({"a": [1, 2]}));
        assert_eq!(
            parser.parse_response(ResponseText::from("[true]")).unwrap(),
            json!([true])
        );
    }

    #[test]
    fn blanket_impls_delegate() {
        let parser = TextParser::new();
        let by_ref = &parser;
        let boxed: Box<dyn OutputParser<Output = String>> = Box::new(TextParser::new());
        assert_eq!(by_ref.parse("Sure! Hi.").unwrap(), "Hi.");
        assert_eq!(boxed.parse("Sure! Hi.").unwrap(), "Hi.");
        assert_eq!(boxed.format("Q"), parser.format("Q"));
    }

    #[test]
    fn fn_parser_wraps_errors_with_raw_text() {
        let parser = FnParser::new(|text: &str| -> anyhow::Result<u8> {
            text.trim()
                .parse::<u8>()
                .map_err(anyhow::Error::from)
                .map_err(|e| e.context("expected a byte"))
        });
        assert_eq!(parser.parse(" 7 ").unwrap(), 7);

        let err = parser.parse("300").unwrap_err();
        assert_eq!(err.raw_output(), "300");
        assert!(err.to_string().starts_with("expected a byte: "));
    }

    #[test]
    fn fn_parser_without_instructions_returns_query() {
        let parser = FnParser::new(|text: &str| -> anyhow::Result<String> { Ok(text.into()) });
        assert_eq!(parser.format("unchanged"), "unchanged");
    }
}
