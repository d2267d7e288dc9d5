//! Parse diagnostics for output parsing.
//!
//! [`ParseDiagnostics`] records what happened during a parse: which
//! extraction strategy produced the value, whether repair or auto-completion
//! was needed, and any thinking content that was stripped along the way.

/// Records what happened during output parsing.
///
/// Returned next to the value by
/// [`JsonParser::parse_with_diagnostics`](crate::output_parser::JsonParser::parse_with_diagnostics).
///
/// # Example
///
/// ```
/// use llm_output_parser::diagnostics::ParseDiagnostics;
///
/// let diag = ParseDiagnostics::default();
/// assert!(diag.ok()); // No parse_error means success
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseDiagnostics {
    /// Which extraction strategy produced the value.
    /// e.g. `"direct"`, `"json_code_block"`, `"object"`, `"array"`. When
    /// JSON extraction fails or another parser ran,
    /// [`OutputStrategy::parse_with_diagnostics`](crate::OutputStrategy::parse_with_diagnostics)
    /// records its own name instead (`"json"`, `"choice"`, ...).
    pub strategy: Option<&'static str>,

    /// If parsing failed, the error message. `None` means success.
    pub parse_error: Option<String>,

    /// Whether JSON repair was applied (trailing commas, single quotes, etc.).
    pub repaired: bool,

    /// Whether truncated JSON had to be closed.
    pub auto_completed: bool,

    /// Thinking content removed before parsing.
    pub thinking: Option<String>,
}

impl ParseDiagnostics {
    /// Quick check: did parsing succeed?
    pub fn ok(&self) -> bool {
        self.parse_error.is_none()
    }

    /// Whether the value needed any correction beyond extraction.
    pub fn corrected(&self) -> bool {
        self.repaired || self.auto_completed
    }
}
