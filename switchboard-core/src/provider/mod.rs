use async_trait::async_trait;
use futures::stream::BoxStream;
use reqwest::Request;

use crate::error::Result;
use crate::message::ChatMessage;
use crate::model::{ModelInfo, SendOptions};

// Include the provider-specific modules
pub mod anthropic;
pub mod openai;

/// Incremental response text. Concatenating every `Ok` item in order yields the
/// full reply; an `Err` item is terminal.
pub type TextStream = BoxStream<'static, Result<String>>;

/// The stable `(name, id)` pair a provider is known by
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Display name, e.g. "Anthropic Claude"
    pub name: String,
    /// Unique key, e.g. "anthropic"
    pub id: String,
}

impl ProviderIdentity {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A backend that can answer a conversation.
///
/// Implementations are stateless with respect to conversation history: every
/// call receives the entire message list. The only mutable state is the
/// default model.
#[async_trait]
pub trait Provider: Send + Sync {
    fn identity(&self) -> &ProviderIdentity;

    fn name(&self) -> &str {
        &self.identity().name
    }

    fn id(&self) -> &str {
        &self.identity().id
    }

    /// Sends the conversation and waits for the complete reply
    ///
    /// # Errors
    ///
    /// Returns the backend's failure unchanged. No retries are attempted.
    async fn send_message(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        options: Option<&SendOptions>,
    ) -> Result<String>;

    /// Sends the conversation and returns the reply as a stream of text deltas
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened. Failures after that
    /// point arrive as the final item of the stream.
    async fn stream_message(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        options: Option<&SendOptions>,
    ) -> Result<TextStream>;

    /// The static model catalog. Never touches the network.
    fn models(&self) -> Vec<ModelInfo>;

    fn default_model(&self) -> &str;

    fn set_default_model(&mut self, model: String);
}

/// Everything a backend needs to build one request
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub system_prompt: Option<&'a str>,
    pub options: Option<&'a SendOptions>,
    pub stream: bool,
}

impl<'a> CompletionRequest<'a> {
    /// The model override, if the caller supplied a non-empty one
    pub fn model_override(&self) -> Option<&'a str> {
        self.options
            .and_then(|o| o.model.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Output token limit, with zero treated as unset
    pub fn max_tokens(&self) -> Option<u32> {
        self.options.and_then(|o| o.max_tokens).filter(|n| *n > 0)
    }

    /// System prompt with empty strings treated as absent
    pub fn system(&self) -> Option<&'a str> {
        self.system_prompt.filter(|s| !s.is_empty())
    }
}

/// An `HttpBackend` can take a conversation and turn it into an http request,
/// and pull reply text back out of the backend's native response shapes.
pub trait HttpBackend: Send + Sync {
    /// Converts a conversation into an HTTP request
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built, for example if the
    /// base URL is invalid or if serialization fails.
    fn accept(&self, request: CompletionRequest<'_>) -> Result<Request>;

    /// Extracts the reply text from a complete (non-streaming) response body
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON or carries an error object.
    fn parse(&self, raw_response_text: String) -> Result<String>;

    /// Returns the function that decodes this backend's streaming events
    fn event_parser(&self) -> EventParser;
}

/// Pulls a text delta out of one server-sent event `data` payload.
/// `Ok(None)` means the event carries no text.
pub type EventParser = fn(&str) -> Result<Option<String>>;
