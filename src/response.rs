//! Response text types: a complete string or a single-pass token stream.
//!
//! A generator hands back either the whole response at once or the
//! fragments as they are produced. Both shapes are modelled as enums so the
//! consumer has to branch before processing, and the token variants are
//! consumed by value, which makes a second read impossible.

use std::fmt;

use futures::stream::{self, BoxStream, Stream, StreamExt};

/// A lazy, single-pass sequence of text fragments. May be unbounded.
pub type TokenGen = Box<dyn Iterator<Item = String> + Send>;

/// The async counterpart of [`TokenGen`].
pub type TokenStream = BoxStream<'static, String>;

/// Text returned by a synchronous generator.
///
/// ```
/// use llm_output_parser::ResponseText;
///
/// let streamed = ResponseText::from_tokens(vec!["{\"a\"".to_string(), ": 1}".to_string()]);
/// assert!(streamed.is_streaming());
/// assert_eq!(streamed.into_text(), "{\"a\": 1}");
/// ```
pub enum ResponseText {
    /// The complete response.
    Text(String),
    /// Fragments in generation order.
    Tokens(TokenGen),
}

impl ResponseText {
    /// Wrap any sendable iterator of fragments.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        ResponseText::Tokens(Box::new(tokens.into_iter()))
    }

    /// Whether this is the token variant.
    pub fn is_streaming(&self) -> bool {
        matches!(self, ResponseText::Tokens(_))
    }

    /// The complete text, if this is the text variant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseText::Text(text) => Some(text),
            ResponseText::Tokens(_) => None,
        }
    }

    /// Concatenate all fragments in order. Blocks until the generator is
    /// exhausted, so never call this on an unbounded generator.
    pub fn into_text(self) -> String {
        match self {
            ResponseText::Text(text) => text,
            ResponseText::Tokens(tokens) => tokens.collect(),
        }
    }

    /// The fragments as a generator; complete text becomes one fragment.
    pub fn into_tokens(self) -> TokenGen {
        match self {
            ResponseText::Text(text) => Box::new(std::iter::once(text)),
            ResponseText::Tokens(tokens) => tokens,
        }
    }
}

impl From<String> for ResponseText {
    fn from(text: String) -> Self {
        ResponseText::Text(text)
    }
}

impl From<&str> for ResponseText {
    fn from(text: &str) -> Self {
        ResponseText::Text(text.to_string())
    }
}

impl fmt::Debug for ResponseText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseText::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ResponseText::Tokens(_) => write!(f, "Tokens(..)"),
        }
    }
}

/// Text returned by an async generator.
pub enum AsyncResponseText {
    /// The complete response.
    Text(String),
    /// Fragments in generation order.
    Stream(TokenStream),
}

impl AsyncResponseText {
    /// Wrap any sendable stream of fragments.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = String> + Send + 'static,
    {
        AsyncResponseText::Stream(stream.boxed())
    }

    /// Whether this is the stream variant.
    pub fn is_streaming(&self) -> bool {
        matches!(self, AsyncResponseText::Stream(_))
    }

    /// Concatenate all fragments in order once the stream ends.
    pub async fn into_text(self) -> String {
        match self {
            AsyncResponseText::Text(text) => text,
            AsyncResponseText::Stream(tokens) => tokens.collect::<String>().await,
        }
    }

    /// The fragments as a stream; complete text becomes one fragment.
    pub fn into_stream(self) -> TokenStream {
        match self {
            AsyncResponseText::Text(text) => stream::once(async move { text }).boxed(),
            AsyncResponseText::Stream(tokens) => tokens,
        }
    }
}

impl From<String> for AsyncResponseText {
    fn from(text: String) -> Self {
        AsyncResponseText::Text(text)
    }
}

impl From<ResponseText> for AsyncResponseText {
    fn from(response: ResponseText) -> Self {
        match response {
            ResponseText::Text(text) => AsyncResponseText::Text(text),
            ResponseText::Tokens(tokens) => AsyncResponseText::Stream(stream::iter(tokens).boxed()),
        }
    }
}

impl fmt::Debug for AsyncResponseText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncResponseText::Text(text) => f.debug_tuple("Text").field(text).finish(),
            AsyncResponseText::Stream(_) => write!(f, "Stream(..)"),
        }
    }
}
