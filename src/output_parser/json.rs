//! Typed JSON extraction from LLM responses.
//!
//! [`parse_json`] and [`parse_json_value`] run the default strategy
//! pipeline; [`JsonParser`] wraps it as an [`OutputParser`] with its own
//! configuration, an optional schema for the format instructions, and
//! [`ParseDiagnostics`] reporting.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::diagnostics::ParseDiagnostics;
use crate::output_parser::complete::auto_complete_json;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::{
    code_blocks, extract_code_block_for, extract_thinking, find_bracketed,
};
use crate::output_parser::repair::try_repair_json;
use crate::parser::OutputParser;
use crate::prompt;

/// Parse an LLM response into a typed value with the default configuration.
///
/// Candidates, tried in order against `T`:
/// 1. The whole preprocessed text
/// 2. A `` ```json `` code block
/// 3. Any code block whose body starts with `{` or `[`
/// 4. The last top-level `{...}`
/// 5. The last top-level `[...]`
///
/// Each candidate is then retried after [`try_repair_json`], and finally
/// after [`auto_complete_json`].
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use llm_output_parser::output_parser::parse_json;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Analysis {
///     sentiment: String,
///     confidence: f64,
/// }
///
/// let response = r#"<think>analyzing...</think>{"sentiment": "positive", "confidence": 0.92}"#;
/// let result: Analysis = parse_json(response).unwrap();
/// assert_eq!(result.sentiment, "positive");
/// ```
pub fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T, ParseError> {
    parse_json_with(response, &ParserConfig::default(), &mut ParseDiagnostics::default())
}

/// Parse into a `serde_json::Value` when you don't know the schema.
pub fn parse_json_value(response: &str) -> Result<Value, ParseError> {
    parse_json(response)
}

/// The full pipeline, honoring `config` and recording into `diag`.
pub(crate) fn parse_json_with<T: DeserializeOwned>(
    response: &str,
    config: &ParserConfig,
    diag: &mut ParseDiagnostics,
) -> Result<T, ParseError> {
    let cleaned = if config.strip_thinking {
        let (thinking, rest) = extract_thinking(response);
        if thinking.is_some() {
            trace!("stripped thinking block before JSON extraction");
        }
        diag.thinking = thinking;
        rest.trim().to_string()
    } else {
        response.trim().to_string()
    };

    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }

    let candidates = json_candidates(&cleaned);
    let mut first_failure: Option<(String, &str)> = None;

    for &(strategy, candidate) in &candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(accept(diag, strategy, value)),
            Err(err) => {
                first_failure.get_or_insert_with(|| (err.to_string(), candidate));
            }
        }
    }

    if config.repair {
        for &(strategy, candidate) in &candidates {
            let Some(fixed) = try_repair_json(candidate) else {
                continue;
            };
            if let Ok(value) = serde_json::from_str::<T>(&fixed) {
                diag.repaired = true;
                return Ok(accept(diag, strategy, value));
            }
        }
    }

    if config.auto_complete {
        for &(strategy, candidate) in &candidates {
            let Some(completed) = auto_complete_json(candidate) else {
                continue;
            };
            if let Ok(value) = serde_json::from_str::<T>(&completed) {
                diag.auto_completed = true;
                return Ok(accept(diag, strategy, value));
            }
        }
    }

    let (reason, candidate) = first_failure.unwrap_or_default();
    let err = ParseError::DeserializationFailed {
        reason,
        candidate: candidate.to_string(),
        raw: response.to_string(),
    };
    debug!(expected = "JSON", error = %err, "no JSON candidate deserialized");
    diag.parse_error = Some(err.to_string());
    Err(err)
}

fn accept<T>(diag: &mut ParseDiagnostics, strategy: &'static str, value: T) -> T {
    debug!(
        strategy,
        repaired = diag.repaired,
        auto_completed = diag.auto_completed,
        "parsed JSON output"
    );
    diag.strategy = Some(strategy);
    value
}

/// Extraction candidates in priority order, without duplicates.
fn json_candidates(cleaned: &str) -> Vec<(&'static str, &str)> {
    let mut candidates: Vec<(&'static str, &str)> = vec![("direct", cleaned)];

    if let Some(body) = extract_code_block_for(cleaned, "json") {
        candidates.push(("json_code_block", body));
    }
    if let Some(block) =
        code_blocks(cleaned).find(|b| b.body.starts_with('{') || b.body.starts_with('['))
    {
        candidates.push(("code_block", block.body));
    }
    if let Some(object) = find_bracketed(cleaned, '{', '}') {
        candidates.push(("object", object));
    }
    if let Some(array) = find_bracketed(cleaned, '[', ']') {
        candidates.push(("array", array));
    }

    let mut seen = Vec::with_capacity(candidates.len());
    candidates.retain(|&(_, text)| {
        if seen.contains(&text) {
            false
        } else {
            seen.push(text);
            true
        }
    });
    candidates
}

/// An [`OutputParser`] producing `T` from JSON in model output.
///
/// Correction strategy: thinking removal, extraction from fences and
/// surrounding prose, [`try_repair_json`] and [`auto_complete_json`], each
/// switchable through [`ParserConfig`]. With the default (lenient) config
/// `{a: 1}` parses as `{"a": 1}`; with [`ParserConfig::strict`] it fails.
///
/// ```
/// use llm_output_parser::{JsonParser, OutputParser};
/// use serde_json::{json, Value};
///
/// let parser = JsonParser::<Value>::new().with_schema(json!({
///     "type": "object",
///     "properties": {"city": {"type": "string"}}
/// }));
///
/// let prompt = parser.format("Where is the Louvre?");
/// assert!(prompt.contains("JSON schema"));
/// assert_eq!(parser.parse("```json\n{'city': 'Paris',}\n```").unwrap(), json!({"city": "Paris"}));
/// ```
pub struct JsonParser<T> {
    schema: Option<Value>,
    config: ParserConfig,
    _output: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonParser<T> {
    pub fn new() -> Self {
        Self {
            schema: None,
            config: ParserConfig::default(),
            _output: PhantomData,
        }
    }

    /// Include a JSON schema in the format instructions.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// The instructions appended by [`OutputParser::format`].
    pub fn format_instructions(&self) -> String {
        match &self.schema {
            Some(schema) => {
                let pretty =
                    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
                format!(
                    "Here's a JSON schema to follow:\n{}\n\nOutput a valid JSON object but do not repeat the schema.",
                    pretty
                )
            }
            None => concat!(
                "Respond with a single valid JSON value and nothing else. ",
                "Do not add explanations or markdown fences."
            )
            .to_string(),
        }
    }

    /// Parse and report what the pipeline had to do.
    pub fn parse_with_diagnostics(
        &self,
        output: &str,
    ) -> (Result<T, ParseError>, ParseDiagnostics) {
        let mut diag = ParseDiagnostics::default();
        let result = parse_json_with(output, &self.config, &mut diag);
        (result, diag)
    }
}

impl<T: DeserializeOwned> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonParser<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            config: self.config.clone(),
            _output: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for JsonParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonParser")
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish()
    }
}

impl<T: DeserializeOwned> OutputParser for JsonParser<T> {
    type Output = T;

    fn parse(&self, output: &str) -> Result<T, ParseError> {
        parse_json_with(output, &self.config, &mut ParseDiagnostics::default())
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tracing_test::traced_test;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Kv {
        key: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Movie {
        title: String,
        year: u16,
    }

    #[test]
    fn direct_object_and_array() {
        let kv: Kv = parse_json(r#"{"key": "value"}"#).unwrap();
        assert_eq!(kv.key, "value");
        let nums: Vec<i32> = parse_json("[1, 2, 3]").unwrap();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn fenced_json_after_prose() {
        let input = "Here's the data:\n```json\n{\"key\": \"value\"}\n```\nAnything else?";
        let kv: Kv = parse_json(input).unwrap();
        assert_eq!(kv.key, "value");
    }

    #[test]
    fn untagged_fence() {
        let kv: Kv = parse_json("```\n{\"key\": \"value\"}\n```").unwrap();
        assert_eq!(kv.key, "value");
    }

    #[test]
    fn object_embedded_in_prose() {
        let input = r#"Sure! The result is {"key": "value"} as requested."#;
        let kv: Kv = parse_json(input).unwrap();
        assert_eq!(kv.key, "value");
    }

    #[test]
    fn later_candidate_used_when_first_has_wrong_shape() {
        // The object candidate fails for Vec, the array candidate succeeds.
        let input = r#"Meta: {"count": 2}. Items: ["a", "b"]"#;
        let items: Vec<String> = parse_json(input).unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn repaired_python_style_dict() {
        let movie: Movie = parse_json("{'title': 'Heat', 'year': 1995,}").unwrap();
        assert_eq!(
            movie,
            Movie {
                title: "Heat".into(),
                year: 1995
            }
        );
    }

    #[test]
    fn truncated_output_is_completed() {
        let parser = JsonParser::<Value>::new();
        let (result, diag) =
            parser.parse_with_diagnostics(r#"{"title": "Heat", "year": 1995, "dir"#);
        assert_eq!(result.unwrap(), json!({"title": "Heat", "year": 1995}));
        assert!(diag.auto_completed);
        assert!(!diag.repaired);
        assert_eq!(diag.strategy, Some("direct"));
    }

    #[test]
    fn diagnostics_capture_thinking_and_strategy() {
        let parser = JsonParser::<Value>::new();
        let (result, diag) =
            parser.parse_with_diagnostics("<think>list them</think>Answer: [1, 2]");
        assert_eq!(result.unwrap(), json!([1, 2]));
        assert_eq!(diag.strategy, Some("array"));
        assert_eq!(diag.thinking.as_deref(), Some("list them"));
        assert!(diag.ok());
        assert!(!diag.corrected());
    }

    #[test]
    fn diagnostics_record_failure() {
        let parser = JsonParser::<Kv>::new();
        let (result, diag) = parser.parse_with_diagnostics(r#"{"other": 1}"#);
        let err = result.unwrap_err();
        assert!(matches!(err, ParseError::DeserializationFailed { .. }));
        assert_eq!(diag.parse_error, Some(err.to_string()));
        assert!(diag.strategy.is_none());
    }

    #[test]
    fn strict_config_disables_completion() {
        let parser = JsonParser::<Value>::new().with_config(ParserConfig::strict());
        assert!(parser.parse(r#"{"a": 1"#).is_err());
        assert!(parser.parse(r#"{"a": 1,}"#).is_err());
        assert_eq!(parser.parse(r#"x {"a": 1} y"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn thinking_kept_when_disabled() {
        let config = ParserConfig::default().with_strip_thinking(false);
        let parser = JsonParser::<Value>::new().with_config(config);
        let (result, diag) = parser.parse_with_diagnostics(r#"<think>{"wrong": 1}</think>"#);
        assert_eq!(result.unwrap(), json!({"wrong": 1}));
        assert!(diag.thinking.is_none());
    }

    #[test]
    fn empty_and_thinking_only_fail_as_empty() {
        for input in ["", "   ", "<think>only thoughts</think>"] {
            let err = parse_json_value(input).unwrap_err();
            assert!(matches!(err, ParseError::EmptyResponse { .. }));
            assert_eq!(err.raw_output(), input);
        }
    }

    #[test]
    fn failure_keeps_candidate_and_raw() {
        let input = "The answer: {\"key\": 42}";
        let err = parse_json::<Kv>(input).unwrap_err();
        match err {
            ParseError::DeserializationFailed { candidate, raw, .. } => {
                assert_eq!(candidate, input);
                assert_eq!(raw, input);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn format_without_schema() {
        let parser = JsonParser::<Value>::new();
        let out = parser.format("List three colors.");
        assert!(out.starts_with("List three colors.\n\n"));
        assert!(out.contains("single valid JSON value"));
    }

    #[test]
    fn format_escapes_schema_braces_when_configured() {
        let parser = JsonParser::<Value>::new()
            .with_schema(json!({"type": "object"}))
            .with_config(ParserConfig::default().with_escape_braces(true));
        let out = parser.format("Describe {item}.");
        assert!(out.starts_with("Describe {item}."));
        assert!(out.contains("{{\n  \"type\": \"object\"\n}}"));
    }

    #[traced_test]
    #[test]
    fn logs_the_winning_strategy() {
        let value = parse_json_value("{'a': 1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert!(logs_contain("parsed JSON output"));
        assert!(logs_contain("repaired=true"));
    }
}
