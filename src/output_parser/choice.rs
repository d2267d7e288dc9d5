//! Choice extraction from LLM responses.
//!
//! [`parse_choice`] picks one of a fixed set of options out of a response,
//! tolerating bold, quotes, parentheses, option numbers and prose.

use std::cmp::Reverse;

use tracing::debug;

use crate::config::ParserConfig;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::preprocess_with;
use crate::parser::OutputParser;
use crate::prompt;

/// Extract a single choice from a set of valid options.
///
/// Matching is case-insensitive and tries, in order:
/// - the whole answer once wrappers are stripped: `**positive**`, `"positive."`, `(positive)`
/// - a 1-based option number: `2` selects the second option
/// - an answer that starts with an option: `positive, because...`
/// - the earliest whole-word occurrence in prose: `I'd call this negative`
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::parse_choice;
///
/// let result = parse_choice("I'd classify this as positive", &["positive", "negative"]).unwrap();
/// assert_eq!(result, "positive");
/// assert_eq!(parse_choice("2.", &["positive", "negative"]).unwrap(), "negative");
/// ```
pub fn parse_choice<'a>(response: &str, valid_choices: &[&'a str]) -> Result<&'a str, ParseError> {
    let index = choose(response, valid_choices, &ParserConfig::default())?;
    Ok(valid_choices[index])
}

/// Index of the matched option in `choices`.
fn choose<S: AsRef<str>>(
    response: &str,
    choices: &[S],
    config: &ParserConfig,
) -> Result<usize, ParseError> {
    let cleaned = preprocess_with(response, config);
    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }

    let lower = cleaned.to_lowercase();
    let stripped = strip_wrappers(&lower);
    let options: Vec<(usize, String)> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| (i, choice.as_ref().trim().to_lowercase()))
        .filter(|(_, choice)| !choice.is_empty())
        .collect();

    if let Some((i, _)) = options.iter().find(|(_, choice)| stripped == choice) {
        return Ok(*i);
    }

    if let Ok(n) = stripped.parse::<usize>() {
        if (1..=choices.len()).contains(&n) {
            debug!(number = n, "choice selected by option number");
            return Ok(n - 1);
        }
    }

    // Among options that match at the same place, the longest wins.
    let leading = options
        .iter()
        .filter(|(_, choice)| {
            stripped
                .strip_prefix(choice.as_str())
                .is_some_and(|rest| !rest.starts_with(char::is_alphanumeric))
        })
        .max_by_key(|(i, choice)| (choice.len(), Reverse(*i)));
    if let Some((i, _)) = leading {
        return Ok(*i);
    }

    let earliest = options
        .iter()
        .filter_map(|(i, choice)| {
            find_word(&lower, choice).map(|pos| (pos, Reverse(choice.len()), *i))
        })
        .min();
    if let Some((_, _, i)) = earliest {
        return Ok(i);
    }

    debug!(options = choices.len(), "no option found in response");
    Err(ParseError::NoMatchingChoice {
        valid: choices.iter().map(|c| c.as_ref().to_string()).collect(),
        raw: response.to_string(),
    })
}

fn strip_wrappers(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | '!' | ',' | '*' | '"' | '\'' | '(' | ')' | '`')
    })
}

/// Byte position of the first occurrence of `needle` bounded by
/// non-alphanumeric characters on both sides.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// An [`OutputParser`] selecting one of a fixed set of options.
#[derive(Debug, Clone)]
pub struct ChoiceParser {
    choices: Vec<String>,
    config: ParserConfig,
}

impl ChoiceParser {
    pub fn new<I>(choices: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn format_instructions(&self) -> String {
        format!(
            "Answer with exactly one of the following options, and nothing else:\n{}",
            prompt::numbered_list(self.choices.as_slice())
        )
    }
}

impl OutputParser for ChoiceParser {
    type Output = String;

    fn parse(&self, output: &str) -> Result<String, ParseError> {
        let index = choose(output, &self.choices, &self.config)?;
        Ok(self.choices[index].clone())
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}
