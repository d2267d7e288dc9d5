//! Error types for LLM output parsers.

/// Number of characters of the raw output shown in error messages.
pub(crate) const PREVIEW_LEN: usize = 200;

/// The failure raised when an LLM response cannot be coerced into the
/// expected structured value.
///
/// Every variant keeps the complete offending text so callers can log or
/// inspect it; the `Display` output only shows a preview.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The LLM response was empty, whitespace-only, or only a thinking block.
    #[error("empty LLM response")]
    EmptyResponse {
        /// The raw response as received.
        raw: String,
    },

    /// No parsing strategy could extract the expected format.
    #[error("could not parse {expected_format} from LLM response: {}", truncate(.raw, PREVIEW_LEN))]
    Unparseable {
        /// The format the parser was trying to extract.
        expected_format: &'static str,
        /// The raw response as received.
        raw: String,
    },

    /// A JSON or YAML candidate was found but failed to deserialize into the
    /// target type.
    #[error("deserialization failed: {reason} (candidate: {})", truncate(.candidate, PREVIEW_LEN))]
    DeserializationFailed {
        /// The serde error message.
        reason: String,
        /// The extracted candidate that was tried first.
        candidate: String,
        /// The raw response as received.
        raw: String,
    },

    /// None of the valid options appeared in the response.
    #[error("no valid choice found in response (valid: {valid:?})")]
    NoMatchingChoice {
        /// The options that were searched for.
        valid: Vec<String>,
        /// The raw response as received.
        raw: String,
    },

    /// No number could be found in the response.
    #[error("no valid number found in response: {}", truncate(.raw, PREVIEW_LEN))]
    NoNumber {
        /// The raw response as received.
        raw: String,
    },

    /// A number was found but lies outside the accepted range.
    #[error("number {value} is outside the range [{min}, {max}]")]
    OutOfRange {
        /// The extracted value.
        value: String,
        /// Inclusive lower bound.
        min: String,
        /// Inclusive upper bound.
        max: String,
        /// The raw response as received.
        raw: String,
    },

    /// A caller-supplied parse function rejected the response.
    #[error("{reason}")]
    Custom {
        /// Description of the failure.
        reason: String,
        /// The raw response as received.
        raw: String,
    },
}

impl ParseError {
    /// The error kind shared by every variant.
    pub const KIND: &'static str = "unparseable output";

    /// Returns [`ParseError::KIND`].
    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    /// The complete raw output that failed to parse.
    pub fn raw_output(&self) -> &str {
        match self {
            ParseError::EmptyResponse { raw }
            | ParseError::Unparseable { raw, .. }
            | ParseError::DeserializationFailed { raw, .. }
            | ParseError::NoMatchingChoice { raw, .. }
            | ParseError::NoNumber { raw }
            | ParseError::OutOfRange { raw, .. }
            | ParseError::Custom { raw, .. } => raw,
        }
    }

    /// Build a [`ParseError::Custom`] from any displayable reason.
    pub fn custom(reason: impl std::fmt::Display, raw: &str) -> Self {
        ParseError::Custom {
            reason: reason.to_string(),
            raw: raw.to_string(),
        }
    }

    pub(crate) fn empty(raw: &str) -> Self {
        ParseError::EmptyResponse {
            raw: raw.to_string(),
        }
    }

    pub(crate) fn unparseable(expected_format: &'static str, raw: &str) -> Self {
        ParseError::Unparseable {
            expected_format,
            raw: raw.to_string(),
        }
    }
}

/// Truncate to at most `max_chars` characters, appending "..." if anything
/// was cut. Never splits a UTF-8 sequence.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
