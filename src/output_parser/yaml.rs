//! YAML extraction from LLM responses (feature `yaml`).

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ParserConfig;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::{extract_code_block, extract_code_block_for, preprocess_with};
use crate::parser::OutputParser;
use crate::prompt;

/// Parse an LLM response containing YAML into `T`.
///
/// Tries a `yaml`/`yml` fenced block, then any fenced block, then the
/// whole response.
///
/// ```
/// use serde::Deserialize;
/// use llm_output_parser::output_parser::parse_yaml;
///
/// #[derive(Deserialize)]
/// struct Person { name: String, age: u32 }
///
/// let person: Person = parse_yaml("Here you go:\n```yaml\nname: Ada\nage: 36\n```").unwrap();
/// assert_eq!(person.name, "Ada");
/// assert_eq!(person.age, 36);
/// ```
pub fn parse_yaml<T: DeserializeOwned>(response: &str) -> Result<T, ParseError> {
    yaml_with(response, &ParserConfig::default())
}

fn yaml_with<T: DeserializeOwned>(response: &str, config: &ParserConfig) -> Result<T, ParseError> {
    let cleaned = preprocess_with(response, config);
    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }

    let tagged = extract_code_block_for(&cleaned, "yaml")
        .or_else(|| extract_code_block_for(&cleaned, "yml"));
    let any = extract_code_block(&cleaned).map(|block| block.body);
    let candidates = [
        ("yaml block", tagged),
        ("code block", any),
        ("direct", Some(cleaned.as_str())),
    ];

    let mut first_failure: Option<(String, &str)> = None;
    for (strategy, candidate) in candidates {
        let Some(candidate) = candidate else {
            continue;
        };
        match serde_yaml::from_str::<T>(candidate) {
            Ok(value) => {
                debug!(strategy, "parsed YAML output");
                return Ok(value);
            }
            Err(err) => {
                first_failure.get_or_insert_with(|| (err.to_string(), candidate));
            }
        }
    }

    match first_failure {
        Some((reason, candidate)) => Err(ParseError::DeserializationFailed {
            reason,
            candidate: candidate.to_string(),
            raw: response.to_string(),
        }),
        None => Err(ParseError::unparseable("YAML", response)),
    }
}

/// An [`OutputParser`] deserializing YAML into `T`.
#[derive(Debug, Clone)]
pub struct YamlParser<T> {
    example: Option<String>,
    config: ParserConfig,
    _output: PhantomData<fn() -> T>,
}

impl<T> YamlParser<T> {
    pub fn new() -> Self {
        Self {
            example: None,
            config: ParserConfig::default(),
            _output: PhantomData,
        }
    }

    /// Show the model an example document in the format instructions.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format_instructions(&self) -> String {
        let mut instructions =
            String::from("Respond with a YAML document inside a ```yaml code block.");
        if let Some(example) = &self.example {
            instructions.push_str("\nFollow the shape of this example:\n```yaml\n");
            instructions.push_str(example.trim_end());
            instructions.push_str("\n```");
        }
        instructions
    }
}

impl<T> Default for YamlParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> OutputParser for YamlParser<T> {
    type Output = T;

    fn parse(&self, output: &str) -> Result<T, ParseError> {
        yaml_with(output, &self.config)
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn direct_document() {
        let person: Person = parse_yaml("name: Josh\nage: 30").unwrap();
        assert_eq!(person, Person { name: "Josh".into(), age: 30 });
    }

    #[test]
    fn yml_fence_and_bare_fence() {
        let person: Person = parse_yaml("```yml\nname: A\nage: 1\n```").unwrap();
        assert_eq!(person.age, 1);
        let person: Person = parse_yaml("Result:\n```\nname: B\nage: 2\n```\nThanks").unwrap();
        assert_eq!(person.name, "B");
    }

    #[test]
    fn thinking_is_stripped() {
        let person: Person = parse_yaml("<think>age: 99</think>\nname: C\nage: 3").unwrap();
        assert_eq!(person.age, 3);
    }

    #[test]
    fn wrong_shape_reports_deserialization_failure() {
        let err = parse_yaml::<Person>("name: D").unwrap_err();
        assert!(matches!(err, ParseError::DeserializationFailed { .. }));
        assert_eq!(err.raw_output(), "name: D");
    }

    #[test]
    fn empty_response() {
        assert!(matches!(parse_yaml::<Person>(" "), Err(ParseError::EmptyResponse { .. })));
    }

    #[test]
    fn parser_format_includes_example() {
        let parser = YamlParser::<Person>::new().with_example("name: Ada\nage: 36\n");
        let out = parser.format("Describe a person.");
        assert!(out.starts_with("Describe a person.\n\n"));
        assert!(out.ends_with("```yaml\nname: Ada\nage: 36\n```"));
        assert_eq!(parser.parse("name: E\nage: 5").unwrap().name, "E");
    }
}
