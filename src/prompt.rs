//! Prompt text helpers used when formatting queries.

use crate::config::ParserConfig;

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

/// Append format instructions to a query.
///
/// The query is kept verbatim; the instructions follow the configured
/// separator and have their braces doubled when
/// [`ParserConfig::escape_braces`] is set.
///
/// ```
/// use llm_output_parser::{prompt, ParserConfig};
///
/// let out = prompt::append_instructions("Rate it.", "Reply with {n}.", &ParserConfig::default());
/// assert_eq!(out, "Rate it.\n\nReply with {n}.");
/// ```
pub fn append_instructions(query: &str, instructions: &str, config: &ParserConfig) -> String {
    let instructions = if config.escape_braces {
        escape_braces(instructions)
    } else {
        instructions.to_string()
    };
    format!("{}{}{}", query, config.instruction_separator, instructions)
}

/// Double every `{` and `}` so the text survives [`render`].
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Substitute `{key}` placeholders in a template.
///
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
/// Unknown placeholders are left in place.
///
/// ```
/// use llm_output_parser::prompt::render;
///
/// let out = render("Hello {name}, JSON: {{\"key\": 1}}", &[("name", "Alice")]);
/// assert_eq!(out, r#"Hello Alice, JSON: {"key": 1}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template
        .replace("{{", ESCAPE_SENTINEL)
        .replace("}}", ESCAPE_SENTINEL_CLOSE);

    for (key, value) in vars {
        rendered = rendered.replace(&format!("{{{}}}", key), value);
    }

    rendered
        .replace(ESCAPE_SENTINEL, "{")
        .replace(ESCAPE_SENTINEL_CLOSE, "}")
}

/// Create a numbered list from items (1-indexed).
pub fn numbered_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text in a labeled section for structured prompts.
pub fn section(label: &str, content: &str) -> String {
    format!("## {}\n{}", label, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_follow_separator() {
        let config = ParserConfig::default().with_instruction_separator("\n---\n");
        assert_eq!(append_instructions("Q", "I", &config), "Q\n---\nI");
    }

    #[test]
    fn escaped_instructions_render_back() {
        let config = ParserConfig::default().with_escape_braces(true);
        let formatted =
            append_instructions("Summarize {topic}.", r#"Use {"summary": "..."}"#, &config);
        assert_eq!(formatted, r#"Summarize {topic}.

Use {{"summary": "..."}}"#);
        assert_eq!(
            render(&formatted, &[("topic", "rust")]),
            "Summarize rust.\n\nUse {\"summary\": \"...\"}"
        );
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        assert_eq!(render("{a} {b}", &[("a", "1")]), "1 {b}");
    }

    #[test]
    fn numbered_list_is_one_indexed() {
        assert_eq!(numbered_list(&["First", "Second"]), "1. First\n2. Second");
        assert_eq!(numbered_list::<&str>(&[]), "");
    }

    #[test]
    fn section_has_heading() {
        assert_eq!(section("Context", "Some knowledge"), "## Context\nSome knowledge");
    }
}
