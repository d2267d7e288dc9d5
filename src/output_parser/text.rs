//! Plain text cleanup for LLM responses.

use crate::config::ParserConfig;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::preprocess_with;
use crate::parser::OutputParser;
use crate::prompt;

/// Interjections models open with before the actual answer.
const OPENERS: &[&str] = &["Sure", "Of course", "Certainly", "Absolutely", "Okay", "OK"];

/// Lead-ins that announce the answer on the rest of their line.
const LEAD_INS: &[&str] = &["Here's ", "Here is ", "Here are "];

/// Clean an LLM response for use as plain text.
///
/// Strips thinking blocks, then a leading interjection ("Sure!",
/// "Certainly, ", "Of course.") and then a lead-in line ending in a colon
/// ("Here's the summary:"). A lead-in without a colon is kept, since it is
/// usually the answer itself.
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::parse_text;
///
/// let result = parse_text("Sure! Here's the answer:\nParis is the capital.").unwrap();
/// assert_eq!(result, "Paris is the capital.");
/// ```
pub fn parse_text(response: &str) -> Result<String, ParseError> {
    text_with(response, &ParserConfig::default())
}

fn text_with(response: &str, config: &ParserConfig) -> Result<String, ParseError> {
    let cleaned = preprocess_with(response, config);
    let text = strip_lead_in(strip_opener(&cleaned)).trim();
    if text.is_empty() {
        return Err(ParseError::empty(response));
    }
    Ok(text.to_string())
}

fn strip_opener(text: &str) -> &str {
    for opener in OPENERS {
        let Some(rest) = text.strip_prefix(opener) else {
            continue;
        };
        let mut chars = rest.chars();
        match chars.next() {
            Some('!' | ',' | '.') => return chars.as_str().trim_start(),
            _ => continue,
        }
    }
    text
}

fn strip_lead_in(text: &str) -> &str {
    if !LEAD_INS.iter().any(|lead| text.starts_with(lead)) {
        return text;
    }
    let line_end = text.find('\n').unwrap_or(text.len());
    match text[..line_end].find(':') {
        Some(colon) => text[colon + 1..].trim_start(),
        None => text,
    }
}

/// An [`OutputParser`] returning cleaned prose.
#[derive(Debug, Clone, Default)]
pub struct TextParser {
    config: ParserConfig,
}

impl TextParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl OutputParser for TextParser {
    type Output = String;

    fn parse(&self, output: &str) -> Result<String, ParseError> {
        text_with(output, &self.config)
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(
            query,
            "Answer directly in plain text, without any preamble.",
            &self.config,
        )
    }
}
