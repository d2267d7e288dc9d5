//! # LLM Output Parser
//!
//! Turn raw language-model text into structured values, and steer models
//! toward text that parses.
//!
//! Generators return either a complete string or a stream of fragments
//! ([`ResponseText`], [`AsyncResponseText`]). An [`OutputParser`] consumes
//! the full text and produces a typed value, correcting common model
//! mistakes on the way, or fails with a [`ParseError`] that carries the
//! offending text. The same parser augments queries with formatting
//! instructions through [`OutputParser::format`].
//!
//! ## Core Concepts
//!
//! - **[`OutputParser`]**: the `parse` / `format` capability. Implemented
//!   by every built-in parser, by [`FnParser`] for closures, and by
//!   references, boxes and `Arc`s of parsers.
//! - **[`ResponseText`]**: complete text or a single-pass [`TokenGen`].
//! - **[`ParseError`]**: the only failure `parse` produces.
//! - **[`ParserConfig`]**: which corrections run and how instructions are
//!   appended.
//! - **[`OutputStrategy`]**: a parser chosen at runtime, yielding
//!   `serde_json::Value`.
//!
//! ## Quick Start
//!
//! ```
//! use llm_output_parser::{JsonParser, OutputParser, ResponseText};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Verdict { label: String, confidence: f64 }
//!
//! let parser = JsonParser::<Verdict>::new();
//! let prompt = parser.format("Classify: 'great product'");
//! assert!(prompt.starts_with("Classify: 'great product'"));
//!
//! // A streamed response with a thinking block and a trailing comma.
//! let response = ResponseText::from_tokens(
//!     ["<think>positive</think>", "{\"label\": \"positive\",", " \"confidence\": 0.9,}"]
//!         .into_iter()
//!         .map(String::from),
//! );
//! let verdict = parser.parse_response(response).unwrap();
//! assert_eq!(verdict.label, "positive");
//! ```
//!
//! ## Strict mode
//!
//! Corrections are on by default. [`ParserConfig::strict`] turns them off:
//!
//! ```
//! use llm_output_parser::{JsonParser, OutputParser, ParserConfig};
//! use serde_json::{json, Value};
//!
//! let lenient = JsonParser::<Value>::new();
//! assert_eq!(lenient.parse("{a: 1}").unwrap(), json!({"a": 1}));
//!
//! let strict = JsonParser::<Value>::new().with_config(ParserConfig::strict());
//! let err = strict.parse("{a: 1}").unwrap_err();
//! assert_eq!(err.raw_output(), "{a: 1}");
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output_parser;
pub mod parser;
pub mod prompt;
pub mod response;
pub mod strategy;

pub use config::ParserConfig;
pub use diagnostics::ParseDiagnostics;
pub use error::{Error, Result};
pub use output_parser::{
    ChoiceParser, JsonParser, ListParser, NumberParser, ParseError, TextParser, XmlTagParser,
    XmlTagsParser,
};
#[cfg(feature = "yaml")]
pub use output_parser::YamlParser;
pub use parser::{FnParser, OutputParser, SharedOutputParser};
pub use response::{AsyncResponseText, ResponseText, TokenGen, TokenStream};
pub use strategy::{CustomParseFn, OutputStrategy};
