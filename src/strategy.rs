//! Runtime-selected parsing into `serde_json::Value`.
//!
//! [`OutputStrategy`] picks one of the built-in parsers by value, for
//! callers that decide the expected shape from configuration rather than
//! types. It is itself an [`OutputParser`] with `Output = Value`.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::ParserConfig;
use crate::diagnostics::ParseDiagnostics;
use crate::output_parser::extract::extract_thinking;
use crate::output_parser::json::parse_json_with;
use crate::output_parser::{
    ChoiceParser, JsonParser, ListParser, NumberParser, ParseError, TextParser, XmlTagParser,
};
use crate::parser::OutputParser;

/// Caller-provided parse function for [`OutputStrategy::Custom`].
pub type CustomParseFn = Arc<dyn Fn(&str) -> Result<Value, ParseError> + Send + Sync>;

/// How raw LLM text is turned into a `serde_json::Value`.
///
/// ```
/// use llm_output_parser::{OutputParser, OutputStrategy};
/// use serde_json::json;
///
/// let strategy = OutputStrategy::Choice(vec!["approve".into(), "reject".into()]);
/// assert_eq!(strategy.parse("I'd reject this.").unwrap(), json!("reject"));
///
/// let lossy = OutputStrategy::default();
/// assert_eq!(lossy.parse("not json").unwrap(), json!("not json"));
/// ```
#[derive(Clone, Default)]
pub enum OutputStrategy {
    /// Never fails: JSON when any can be extracted, otherwise the trimmed
    /// text as a string.
    #[default]
    Lossy,

    /// Full JSON extraction with repair and auto-completion.
    Json,

    /// A list of strings as an array, items kept as written.
    StringList,

    /// The body of the named tag as a string.
    XmlTag(String),

    /// The matched option as a string.
    Choice(Vec<String>),

    /// A number (`f64`).
    Number,

    /// A number within `[min, max]`.
    NumberInRange(f64, f64),

    /// Prose with thinking and boilerplate removed.
    Text,

    /// A caller-provided parse function. `format` leaves queries unchanged.
    Custom(CustomParseFn),
}

impl OutputStrategy {
    pub fn custom<F>(parse: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ParseError> + Send + Sync + 'static,
    {
        OutputStrategy::Custom(Arc::new(parse))
    }

    /// Short name recorded in [`ParseDiagnostics::strategy`] unless the
    /// JSON pipeline recorded a more specific extraction strategy.
    pub fn name(&self) -> &'static str {
        match self {
            OutputStrategy::Lossy => "lossy",
            OutputStrategy::Json => "json",
            OutputStrategy::StringList => "string_list",
            OutputStrategy::XmlTag(_) => "xml_tag",
            OutputStrategy::Choice(_) => "choice",
            OutputStrategy::Number => "number",
            OutputStrategy::NumberInRange(..) => "number_in_range",
            OutputStrategy::Text => "text",
            OutputStrategy::Custom(_) => "custom",
        }
    }

    /// Parse without failing.
    ///
    /// Errors are recorded in the returned diagnostics and the value falls
    /// back to the response text (thinking removed) as a string.
    ///
    /// ```
    /// use llm_output_parser::OutputStrategy;
    /// use serde_json::json;
    ///
    /// let strategy = OutputStrategy::Number;
    /// let (value, diag) = strategy.parse_with_diagnostics("<think>hm</think>no idea");
    /// assert_eq!(value, json!("no idea"));
    /// assert!(!diag.ok());
    /// assert_eq!(diag.thinking.as_deref(), Some("hm"));
    /// ```
    pub fn parse_with_diagnostics(&self, output: &str) -> (Value, ParseDiagnostics) {
        let mut diag = ParseDiagnostics::default();
        let result = match self {
            OutputStrategy::Json => parse_json_with(output, &ParserConfig::default(), &mut diag),
            other => {
                diag.thinking = extract_thinking(output).0;
                other.parse(output)
            }
        };
        // JSON records its own extraction strategy; keep it.
        diag.strategy.get_or_insert(self.name());

        let value = match result {
            Ok(value) => value,
            Err(err) => {
                debug!(strategy = self.name(), error = %err, "falling back to raw text");
                diag.parse_error = Some(err.to_string());
                Value::String(extract_thinking(output).1.trim().to_string())
            }
        };
        (value, diag)
    }
}

impl OutputParser for OutputStrategy {
    type Output = Value;

    fn parse(&self, output: &str) -> Result<Value, ParseError> {
        match self {
            OutputStrategy::Lossy => Ok(JsonParser::<Value>::new()
                .parse(output)
                .unwrap_or_else(|_| Value::String(extract_thinking(output).1.trim().to_string()))),
            OutputStrategy::Json => JsonParser::<Value>::new().parse(output),
            OutputStrategy::StringList => ListParser::raw()
                .parse(output)
                .map(|items| Value::Array(items.into_iter().map(Value::String).collect())),
            OutputStrategy::XmlTag(tag) => {
                XmlTagParser::new(tag.as_str()).parse(output).map(Value::String)
            }
            OutputStrategy::Choice(choices) => ChoiceParser::new(choices.iter().cloned())
                .parse(output)
                .map(Value::String),
            OutputStrategy::Number => NumberParser::<f64>::new().parse(output).map(|n| json!(n)),
            OutputStrategy::NumberInRange(min, max) => NumberParser::new()
                .with_range(*min, *max)
                .parse(output)
                .map(|n| json!(n)),
            OutputStrategy::Text => TextParser::new().parse(output).map(Value::String),
            OutputStrategy::Custom(parse) => parse(output),
        }
    }

    fn format(&self, query: &str) -> String {
        match self {
            OutputStrategy::Lossy | OutputStrategy::Custom(_) => query.to_string(),
            OutputStrategy::Json => JsonParser::<Value>::new().format(query),
            OutputStrategy::StringList => ListParser::raw().format(query),
            OutputStrategy::XmlTag(tag) => XmlTagParser::new(tag.as_str()).format(query),
            OutputStrategy::Choice(choices) => {
                ChoiceParser::new(choices.iter().cloned()).format(query)
            }
            OutputStrategy::Number => NumberParser::<f64>::new().format(query),
            OutputStrategy::NumberInRange(min, max) => {
                NumberParser::new().with_range(*min, *max).format(query)
            }
            OutputStrategy::Text => TextParser::new().format(query),
        }
    }
}

impl fmt::Debug for OutputStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStrategy::Lossy => write!(f, "Lossy"),
            OutputStrategy::Json => write!(f, "Json"),
            OutputStrategy::StringList => write!(f, "StringList"),
            OutputStrategy::XmlTag(tag) => f.debug_tuple("XmlTag").field(tag).finish(),
            OutputStrategy::Choice(choices) => f.debug_tuple("Choice").field(choices).finish(),
            OutputStrategy::Number => write!(f, "Number"),
            OutputStrategy::NumberInRange(min, max) => {
                f.debug_tuple("NumberInRange").field(min).field(max).finish()
            }
            OutputStrategy::Text => write!(f, "Text"),
            OutputStrategy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
