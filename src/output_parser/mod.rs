//! # Built-in output parsers
//!
//! Parsers for extracting structured data from raw LLM responses. They
//! handle thinking blocks, markdown fences, prose around the payload and
//! malformed JSON without another model call.
//!
//! ## Parsers
//!
//! | Function | Parser | Output |
//! |----------|--------|--------|
//! | [`parse_json`] | [`JsonParser`] | any `DeserializeOwned` type |
//! | [`parse_json_value`] | `JsonParser<Value>` | `serde_json::Value` |
//! | [`parse_string_list`] | [`ListParser::tags`] | normalized tags |
//! | [`parse_string_list_raw`] | [`ListParser::raw`] | items as written |
//! | [`parse_choice`] | [`ChoiceParser`] | one of a fixed set of options |
//! | [`parse_number`] | [`NumberParser`] | any `FromStr` number |
//! | [`parse_number_in_range`] | [`NumberParser::with_range`] | a bounded number |
//! | [`parse_xml_tag`] | [`XmlTagParser`] | content of one tag |
//! | [`parse_xml_tags`] | [`XmlTagsParser`] | contents of several tags |
//! | [`parse_text`] | [`TextParser`] | prose without boilerplate |
//! | `parse_yaml` | `YamlParser` | YAML (feature `yaml`) |
//!
//! ## Shared utilities
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`preprocess`] | Strip thinking blocks and trim |
//! | [`strip_think_tags`] | Remove `<think>`/`<thinking>` blocks |
//! | [`try_repair_json`] | Fix common JSON mistakes |
//! | [`auto_complete_json`] | Close truncated JSON |

pub mod choice;
pub mod complete;
pub mod error;
pub mod extract;
pub mod json;
pub mod list;
pub mod number;
pub mod repair;
mod scan;
pub mod text;
pub mod xml;

#[cfg(feature = "yaml")]
pub mod yaml;

pub use choice::{parse_choice, ChoiceParser};
pub use complete::auto_complete_json;
pub use error::ParseError;
pub use extract::{preprocess, strip_think_tags};
pub use json::{parse_json, parse_json_value, JsonParser};
pub use list::{parse_string_list, parse_string_list_raw, ListParser};
pub use number::{parse_number, parse_number_in_range, NumberParser};
pub use repair::try_repair_json;
pub use text::{parse_text, TextParser};
pub use xml::{parse_xml_tag, parse_xml_tags, XmlTagParser, XmlTagsParser};

#[cfg(feature = "yaml")]
pub use yaml::{parse_yaml, YamlParser};
