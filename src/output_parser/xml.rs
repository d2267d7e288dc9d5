//! XML-style tag extraction from LLM responses.
//!
//! These are delimiter matchers, not an XML parser: tags are matched
//! case-sensitively, attributes on the opening tag are skipped and nesting
//! of the same tag is not tracked.

use std::collections::HashMap;

use tracing::debug;

use crate::config::ParserConfig;
use crate::output_parser::error::ParseError;
use crate::output_parser::extract::preprocess_with;
use crate::parser::OutputParser;
use crate::prompt;

/// Extract the trimmed content of the first `<tag>...</tag>` pair.
///
/// A missing closing tag reads to the end of the response.
///
/// # Examples
///
/// ```
/// use llm_output_parser::output_parser::parse_xml_tag;
///
/// let response = "<answer lang=\"en\">The capital is Paris.</answer>";
/// assert_eq!(parse_xml_tag(response, "answer").unwrap(), "The capital is Paris.");
/// ```
pub fn parse_xml_tag(response: &str, tag: &str) -> Result<String, ParseError> {
    tag_with(response, tag, &ParserConfig::default())
}

/// Extract several tags into a `tag -> content` map.
///
/// Missing tags are absent from the map; the call fails only when none of
/// them is present.
///
/// ```
/// use llm_output_parser::output_parser::parse_xml_tags;
///
/// let response = "<analysis>Looks good</analysis><confidence>0.95</confidence>";
/// let result = parse_xml_tags(response, &["analysis", "confidence", "notes"]).unwrap();
/// assert_eq!(result["analysis"], "Looks good");
/// assert_eq!(result["confidence"], "0.95");
/// assert!(!result.contains_key("notes"));
/// ```
pub fn parse_xml_tags(
    response: &str,
    tags: &[&str],
) -> Result<HashMap<String, String>, ParseError> {
    tags_with(response, tags, &ParserConfig::default())
}

fn tag_with(response: &str, tag: &str, config: &ParserConfig) -> Result<String, ParseError> {
    let cleaned = preprocess_with(response, config);
    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }
    tag_content(&cleaned, tag).map(str::to_string).ok_or_else(|| {
        debug!(tag, "tag not found");
        ParseError::unparseable("XML tag", response)
    })
}

fn tags_with<S: AsRef<str>>(
    response: &str,
    tags: &[S],
    config: &ParserConfig,
) -> Result<HashMap<String, String>, ParseError> {
    let cleaned = preprocess_with(response, config);
    if cleaned.is_empty() {
        return Err(ParseError::empty(response));
    }

    let found: HashMap<String, String> = tags
        .iter()
        .filter_map(|tag| {
            let tag = tag.as_ref();
            tag_content(&cleaned, tag).map(|content| (tag.to_string(), content.to_string()))
        })
        .collect();

    if found.is_empty() {
        debug!(tags = tags.len(), "none of the tags found");
        return Err(ParseError::unparseable("XML tags", response));
    }
    Ok(found)
}

fn tag_content<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let start = open_tag_end(text, tag)?;
    let body = &text[start..];
    let close = format!("</{tag}>");
    let content = body.find(&close).map_or(body, |end| &body[..end]);
    Some(content.trim())
}

/// Byte offset just past the first opening tag for `tag`, allowing
/// attributes (`<tag key="v">`). `<tagged>` does not match `tag`.
fn open_tag_end(text: &str, tag: &str) -> Option<usize> {
    let needle = format!("<{tag}");
    text.match_indices(&needle).find_map(|(pos, _)| {
        let rest = &text[pos + needle.len()..];
        match rest.chars().next()? {
            '>' => Some(pos + needle.len() + 1),
            c if c.is_whitespace() => rest.find('>').map(|gt| pos + needle.len() + gt + 1),
            _ => None,
        }
    })
}

/// An [`OutputParser`] returning the content of one tag.
#[derive(Debug, Clone)]
pub struct XmlTagParser {
    tag: String,
    config: ParserConfig,
}

impl XmlTagParser {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format_instructions(&self) -> String {
        format!(
            "Put your final answer between <{tag}> and </{tag}> tags.",
            tag = self.tag
        )
    }
}

impl OutputParser for XmlTagParser {
    type Output = String;

    fn parse(&self, output: &str) -> Result<String, ParseError> {
        tag_with(output, &self.tag, &self.config)
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}

/// An [`OutputParser`] returning the content of several tags.
#[derive(Debug, Clone)]
pub struct XmlTagsParser {
    tags: Vec<String>,
    config: ParserConfig,
}

impl XmlTagsParser {
    pub fn new<I>(tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format_instructions(&self) -> String {
        let layout: Vec<String> = self
            .tags
            .iter()
            .map(|tag| format!("<{tag}>...</{tag}>"))
            .collect();
        format!(
            "Structure your answer with these tags, in this order:\n{}",
            layout.join("\n")
        )
    }
}

impl OutputParser for XmlTagsParser {
    type Output = HashMap<String, String>;

    fn parse(&self, output: &str) -> Result<HashMap<String, String>, ParseError> {
        tags_with(output, &self.tags, &self.config)
    }

    fn format(&self, query: &str) -> String {
        prompt::append_instructions(query, &self.format_instructions(), &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_tag() {
        assert_eq!(parse_xml_tag("<answer>Paris</answer>", "answer").unwrap(), "Paris");
    }

    #[test]
    fn content_is_trimmed() {
        let input = "Reasoning first.\n<answer>\n  42\n</answer>\nDone.";
        let result = parse_xml_tag(input, "answer").unwrap();
        assert_eq!(result, "42");
    }

    #[test]
    fn thinking_is_stripped_first() {
        let input = "<think>maybe <answer>Lyon</answer>?</think><answer>Paris</answer>";
        assert_eq!(parse_xml_tag(input, "answer").unwrap(), "Paris");
    }

    #[test]
    fn missing_close_reads_to_end() {
        assert_eq!(parse_xml_tag("<answer>Paris is", "answer").unwrap(), "Paris is");
    }

    #[test]
    fn attributes_are_skipped() {
        let input = "<answer confidence=\"high\">Paris</answer>";
        assert_eq!(parse_xml_tag(input, "answer").unwrap(), "Paris");
    }

    #[test]
    fn prefix_named_tags_do_not_match() {
        let input = "<answers>wrong</answers><answer>right</answer>";
        assert_eq!(parse_xml_tag(input, "answer").unwrap(), "right");
    }

    #[test]
    fn tags_are_case_sensitive() {
        let err = parse_xml_tag("<Answer>Paris</Answer>", "answer").unwrap_err();
        assert!(matches!(err, ParseError::Unparseable { expected_format: "XML tag", .. }));
    }

    #[test]
    fn first_occurrence_wins() {
        let input = "<a>one</a><a>two</a>";
        assert_eq!(parse_xml_tag(input, "a").unwrap(), "one");
    }

    #[test]
    fn multiple_tags_partial() {
        let result = parse_xml_tags("<title>T</title>", &["title", "body"]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["title"], "T");
    }

    #[test]
    fn multiple_tags_none_found() {
        let err = parse_xml_tags("plain text", &["title", "body"]).unwrap_err();
        assert!(matches!(err, ParseError::Unparseable { expected_format: "XML tags", .. }));
        assert_eq!(err.raw_output(), "plain text");
    }

    #[test]
    fn empty_response() {
        assert!(matches!(
            parse_xml_tag("<think>only thoughts</think>", "answer"),
            Err(ParseError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn tag_parser_round_trip() {
        let parser = XmlTagParser::new("answer");
        let prompt = parser.format("Capital of France?");
        assert!(prompt.ends_with("between <answer> and </answer> tags."));
        assert_eq!(parser.parse("<answer>Paris</answer>").unwrap(), "Paris");
    }

    #[test]
    fn tags_parser_lists_layout() {
        let parser = XmlTagsParser::new(["analysis", "verdict"]);
        let prompt = parser.format("Review this.");
        assert!(prompt.contains("<analysis>...</analysis>\n<verdict>...</verdict>"));
        let parsed = parser.parse("<verdict>ok</verdict>").unwrap();
        assert_eq!(parsed.get("verdict").map(String::as_str), Some("ok"));
    }
}
