// curl https://api.anthropic.com/v1/messages \
//      --header "x-api-key: $ANTHROPIC_API_KEY" \
//      --header "anthropic-version: 2023-06-01" \
//      --header "content-type: application/json" \
//      --data \
// '{
//     "model": "claude-sonnet-4-20250514",
//     "max_tokens": 1024,
//     "system": "You are a helpful AI assistant.",
//     "stream": true,
//     "messages": [{"role": "user", "content": "Hello"}]
// }'

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, instrument, trace};

use crate::error::{Error, Result};
use crate::message::{ChatMessage, Role};
use crate::model::{ModelInfo, SendOptions};
use crate::provider::{
    CompletionRequest, EventParser, HttpBackend, Provider, ProviderIdentity, TextStream,
};
use crate::secret::Secret;
use crate::transport::HttpTransport;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const API_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`; this is used when the caller gives none
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration for the Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication
    pub api_key: Secret<String>,
    /// Base URL for the API
    pub base_url: String,
    /// API version header
    pub api_version: String,
    /// Default model to use
    pub default_model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default().into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: API_VERSION.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Implementation of the Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    config: AnthropicConfig,
    identity: ProviderIdentity,
    transport: HttpTransport,
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the default configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use switchboard_core::provider::anthropic::AnthropicProvider;
    /// use switchboard_core::Provider;
    ///
    /// let provider = AnthropicProvider::new();
    /// assert_eq!(provider.id(), "anthropic");
    /// ```
    pub fn new() -> Self {
        Self::with_config(AnthropicConfig::default())
    }

    /// Creates a new Anthropic provider with a custom configuration
    #[instrument(skip(config), level = "debug")]
    pub fn with_config(config: AnthropicConfig) -> Self {
        info!("Creating Anthropic provider");
        debug!("API key set: {}", !config.api_key.is_empty());
        debug!("Base URL: {}", config.base_url);

        Self {
            config,
            identity: ProviderIdentity::new("Anthropic Claude", "anthropic"),
            transport: HttpTransport::new(),
        }
    }

    /// Creates a new Anthropic provider with an API key
    ///
    /// # Examples
    ///
    /// ```
    /// use switchboard_core::provider::anthropic::AnthropicProvider;
    ///
    /// let provider = AnthropicProvider::with_api_key("your_api_key");
    /// ```
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::with_config(AnthropicConfig {
            api_key: Secret::new(api_key.into()),
            ..Default::default()
        })
    }

    /// Replaces the HTTP transport (custom client, timeouts, ...)
    #[must_use]
    pub fn with_transport(mut self, transport: HttpTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// System turns are not part of the messages array; the system prompt travels
    /// in the top-level `system` field instead.
    fn convert_messages(messages: &[ChatMessage]) -> Vec<AnthropicMessage> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| AnthropicMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn create_request_payload(&self, request: &CompletionRequest<'_>) -> AnthropicRequest {
        let options = request.options.cloned().unwrap_or_default();
        let model = request
            .model_override()
            .unwrap_or(&self.config.default_model)
            .to_string();
        debug!("Using model ID: {}", model);

        AnthropicRequest {
            model,
            max_tokens: request.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system().map(str::to_string),
            messages: Self::convert_messages(request.messages),
            temperature: options.temperature,
            top_p: options.top_p,
            stream: request.stream.then_some(true),
        }
    }
}

impl HttpBackend for AnthropicProvider {
    fn accept(&self, request: CompletionRequest<'_>) -> Result<Request> {
        info!("Creating request for anthropic");
        debug!("Messages in history: {}", request.messages.len());

        let url_str = format!("{}/messages", self.config.base_url.trim_end_matches('/'));
        let url = Url::parse(&url_str).map_err(|e| {
            error!("Failed to parse URL '{}': {}", url_str, e);
            Error::from(e)
        })?;

        let mut req = Request::new(Method::POST, url);

        let api_key: HeaderValue = self
            .config
            .api_key
            .expose()
            .parse()
            .map_err(|_| Error::Authentication("Invalid API key format".into()))?;
        let version: HeaderValue = self
            .config
            .api_version
            .parse()
            .map_err(|_| Error::Other("Invalid API version header".into()))?;

        let headers = req.headers_mut();
        headers.insert("x-api-key", api_key);
        headers.insert("anthropic-version", version);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let payload = self.create_request_payload(&request);
        trace!("Number of messages: {}", payload.messages.len());

        let body_bytes = serde_json::to_vec(&payload)?;
        debug!("Payload serialized ({} bytes)", body_bytes.len());
        *req.body_mut() = Some(body_bytes.into());

        Ok(req)
    }

    fn parse(&self, raw_response_text: String) -> Result<String> {
        trace!("Raw response: {}", raw_response_text);

        let response: AnthropicResponse = serde_json::from_str(&raw_response_text)?;
        if let Some(err) = response.error {
            error!("Anthropic API returned an error: {}", err.message);
            return Err(Error::Other(err.message));
        }

        if let Some(usage) = &response.usage {
            debug!(
                "Token usage - input: {}, output: {}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(response
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .unwrap_or_default())
    }

    fn event_parser(&self) -> EventParser {
        parse_stream_event
    }
}

/// Text arrives as `content_block_delta` events whose delta is a `text_delta`.
/// Every other event type is bookkeeping, except `error`, which ends the stream.
fn parse_stream_event(data: &str) -> Result<Option<String>> {
    let event: StreamEvent =
        serde_json::from_str(data).map_err(|e| Error::Stream(e.to_string()))?;

    match event.event_type.as_str() {
        "content_block_delta" => Ok(event
            .delta
            .filter(|d| d.delta_type.as_deref() == Some("text_delta"))
            .and_then(|d| d.text)),
        "error" => {
            let message = event
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown stream error".to_string());
            Err(Error::Stream(message))
        }
        _ => Ok(None),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        options: Option<&SendOptions>,
    ) -> Result<String> {
        let request = CompletionRequest {
            messages,
            system_prompt,
            options,
            stream: false,
        };
        self.transport.complete(self, request).await
    }

    async fn stream_message(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        options: Option<&SendOptions>,
    ) -> Result<TextStream> {
        let request = CompletionRequest {
            messages,
            system_prompt,
            options,
            stream: true,
        };
        self.transport.stream(self, request).await
    }

    fn models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("claude-sonnet-4-20250514", "Claude Sonnet 4")
                .with_description("Latest flagship model")
                .with_max_output_tokens(8192),
            ModelInfo::new("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet")
                .with_description("High performance for complex tasks")
                .with_max_output_tokens(8192),
            ModelInfo::new("claude-3-opus-20240229", "Claude 3 Opus")
                .with_description("Most capable Claude 3 model")
                .with_max_output_tokens(4096),
            ModelInfo::new("claude-3-sonnet-20240229", "Claude 3 Sonnet")
                .with_description("Balanced speed and capability")
                .with_max_output_tokens(4096),
            ModelInfo::new("claude-3-haiku-20240307", "Claude 3 Haiku")
                .with_description("Fastest and most economical")
                .with_max_output_tokens(4096),
        ]
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn set_default_model(&mut self, model: String) {
        info!("anthropic: default model set to {}", model);
        self.config.default_model = model;
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnthropicRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicResponse {
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
    pub usage: Option<AnthropicUsage>,
    pub error: Option<AnthropicError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<StreamDelta>,
    error: Option<AnthropicError>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
}
