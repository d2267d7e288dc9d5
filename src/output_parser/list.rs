//! String list extraction from LLM responses.
//!
//! [`parse_string_list`] normalizes items for use as tags;
//! [`parse_string_list_raw`] keeps them as written. [`ListParser`] exposes
//! both as an [`OutputParser`].

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::config::ParserConfig;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::{code_blocks, find_bracketed, preprocess_with};
use crate::output_parser::repair::try_repair_json;
use crate::parser::OutputParser;
use crate::prompt;

/// Keys under which models like to nest a list inside an object.
const LIST_KEYS: [&str; 4] = ["tags", "items", "results", "list"];

/// Items at or above this many bytes are dropped by tag normalization.
const MAX_TAG_LEN: usize = 50;

/// Parse an LLM response into a normalized list of tags.
///
/// Normalization: trim, lowercase, deduplicate, drop empty items and items
/// of 50 or more bytes.
///
/// Strategies (in order):
/// 1. JSON array (scalars are stringified)
/// 2. JSON object with a `tags`, `items`, `results` or `list` array
/// 3. The same inside a fenced code block or bracketed region
/// 4. JSON repair on those candidates
/// 5. Numbered or bulleted lines (at least two)
/// 6. Comma-separated fallback
///
/// ```
/// use llm_output_parser::output_parser::parse_string_list;
///
/// let tags = parse_string_list("<think>hm</think>- Cat\n- cat\n- Indoor").unwrap();
/// assert_eq!(tags, vec!["cat", "indoor"]);
/// ```
pub fn parse_string_list(response: &str) -> Result<Vec<String>, ParseError> {
    parse_list_with(response, &ParserConfig::default()).map(normalize_tags)
}

/// Parse into a list without tag normalization: items are only trimmed and
/// empty items dropped.
pub fn parse_string_list_raw(response: &str) -> Result<Vec<String>, ParseError> {
    parse_list_with(response, &ParserConfig::default()).map(trim_items)
}

fn parse_list_with(response: &str, config: &ParserConfig) -> Result<Vec<String>, ParseError> {
    let cleaned = preprocess_with(response, config);
    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }

    let mut candidates: Vec<&str> = vec![&cleaned];
    candidates.extend(code_blocks(&cleaned).map(|block| block.body));
    candidates.extend(find_bracketed(&cleaned, '[', ']'));
    candidates.extend(find_bracketed(&cleaned, '{', '}'));

    if let Some(items) = candidates.iter().find_map(|c| items_from_json(c)) {
        return Ok(items);
    }

    if config.repair {
        let repaired = candidates
            .iter()
            .filter_map(|c| try_repair_json(c))
            .find_map(|fixed| items_from_json(&fixed));
        if let Some(items) = repaired {
            debug!("list extracted from repaired JSON");
            return Ok(items);
        }
    }

    if let Some(items) = items_from_lines(&cleaned) {
        return Ok(items);
    }

    let items: Vec<String> = cleaned
        .split(|c| c == ',' || c == '\n')
        .map(|item| item.trim().trim_matches('"').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        debug!(expected = "string list", "no list items found");
        return Err(ParseError::unparseable("string list", response));
    }
    Ok(items)
}

/// A JSON array of scalars, or such an array under one of [`LIST_KEYS`].
fn items_from_json(text: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let array = match &value {
        Value::Array(items) => items,
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };
    let items: Vec<String> = array.iter().filter_map(scalar_to_string).collect();
    (!items.is_empty() || array.is_empty()).then_some(items)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Items from numbered (`1.`, `2)`) or bulleted (`-`, `*`, `•`) lines.
fn items_from_lines(text: &str) -> Option<Vec<String>> {
    let items: Vec<String> = text
        .lines()
        .filter_map(|line| list_item(line.trim()))
        .map(|item| item.trim_matches('"').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    (items.len() >= 2).then_some(items)
}

fn list_item(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &line[digits..];
        return rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'));
    }
    ["- ", "* ", "\u{2022}"]
        .iter()
        .find_map(|bullet| line.strip_prefix(bullet))
}

fn normalize_tags(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty() && item.len() < MAX_TAG_LEN && seen.insert(item.clone()))
        .collect()
}

fn trim_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// An [`OutputParser`] producing a list of strings.
///
/// ```
/// use llm_output_parser::{ListParser, OutputParser};
///
/// let parser = ListParser::raw();
/// assert_eq!(parser.parse("1. Alpha\n2. Beta").unwrap(), vec!["Alpha", "Beta"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListParser {
    normalize: bool,
    config: ParserConfig,
}

impl ListParser {
    /// Items as written (trimmed, empties dropped).
    pub fn raw() -> Self {
        Self::default()
    }

    /// Items normalized as tags, see [`parse_string_list`].
    pub fn tags() -> Self {
        Self {
            normalize: true,
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format_instructions(&self) -> String {
        let mut instructions =
            String::from("Respond with a JSON array of strings, for example: [\"first\", \"second\"].");
        if self.normalize {
            instructions.push_str(" Use short lowercase items without duplicates.");
        }
        instructions
    }
}

impl OutputParser for ListParser {
    type Output = Vec<String>;

    fn parse(&self, output: &str) -> Result<Vec<String>, ParseError> {
        let items = parse_list_with(output, &self.config)?;
        Ok(if self.normalize {
            normalize_tags(items)
        } else {
            trim_items(items)
        })
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}
