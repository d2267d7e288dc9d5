//! Parser configuration.
//!
//! [`ParserConfig`] controls how leniently the built-in parsers correct
//! model output and how `format` attaches instructions to a query. It can be
//! built in code with the `with_*` setters or loaded from JSON (and YAML with
//! the `yaml` feature).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shared configuration for the built-in output parsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Remove `<think>` / `<thinking>` blocks before parsing.
    pub strip_thinking: bool,

    /// Apply JSON repair heuristics (quotes, commas, comments, literals).
    pub repair: bool,

    /// Close truncated JSON (unterminated strings, open brackets).
    pub auto_complete: bool,

    /// Double `{` and `}` in format instructions so the formatted query can
    /// be used as a `{var}`-style template.
    pub escape_braces: bool,

    /// Text placed between the query and the format instructions.
    pub instruction_separator: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strip_thinking: true,
            repair: true,
            auto_complete: true,
            escape_braces: false,
            instruction_separator: "\n\n".to_string(),
        }
    }
}

impl ParserConfig {
    /// No correction at all: only exact extraction strategies are used.
    pub fn strict() -> Self {
        Self {
            repair: false,
            auto_complete: false,
            ..Self::default()
        }
    }

    pub fn with_strip_thinking(mut self, enabled: bool) -> Self {
        self.strip_thinking = enabled;
        self
    }

    pub fn with_repair(mut self, enabled: bool) -> Self {
        self.repair = enabled;
        self
    }

    pub fn with_auto_complete(mut self, enabled: bool) -> Self {
        self.auto_complete = enabled;
        self
    }

    pub fn with_escape_braces(mut self, enabled: bool) -> Self {
        self.escape_braces = enabled;
        self
    }

    pub fn with_instruction_separator(mut self, separator: impl Into<String>) -> Self {
        self.instruction_separator = separator.into();
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.instruction_separator.is_empty() {
            return Err(Error::InvalidConfig(
                "instruction_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate a configuration from JSON. Missing fields take
    /// their default values.
    ///
    /// ```
    /// use llm_output_parser::ParserConfig;
    ///
    /// let config = ParserConfig::from_json_str(r#"{"repair": false}"#).unwrap();
    /// assert!(!config.repair);
    /// assert!(config.strip_thinking);
    /// ```
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
