use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{Error, Result};
use crate::message::ChatMessage;
use crate::model::{ModelInfo, SendOptions};
use crate::provider::{
    CompletionRequest, EventParser, HttpBackend, Provider, ProviderIdentity, TextStream,
};
use crate::secret::Secret;
use crate::transport::HttpTransport;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for an OpenAI-compatible provider.
///
/// Any service that speaks the Chat Completions API (DeepSeek, DashScope,
/// Moonshot, OpenRouter, Ollama, ...) can be registered by overriding the
/// base URL, identity and model catalog.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: Secret<String>,
    /// Base URL for the API
    pub base_url: String,
    /// Organization ID (optional)
    pub organization: Option<String>,
    /// Model used when a call does not override it
    pub default_model: String,
    /// Registry key
    pub id: String,
    /// Display name
    pub name: String,
    /// Model catalog; `None` uses the stock OpenAI list
    pub models: Option<Vec<ModelInfo>>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default().into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: env::var("OPENAI_ORGANIZATION").ok(),
            default_model: DEFAULT_MODEL.to_string(),
            id: "openai".to_string(),
            name: "OpenAI".to_string(),
            models: None,
        }
    }
}

/// Implementation of the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    config: OpenAIConfig,
    identity: ProviderIdentity,
    models: Vec<ModelInfo>,
    transport: HttpTransport,
}

impl OpenAIProvider {
    /// Creates a new OpenAIProvider with default configuration
    ///
    /// This method will use the OPENAI_API_KEY environment variable for authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use switchboard_core::provider::openai::OpenAIProvider;
    /// use switchboard_core::Provider;
    ///
    /// let provider = OpenAIProvider::new();
    /// assert_eq!(provider.id(), "openai");
    /// ```
    pub fn new() -> Self {
        Self::with_config(OpenAIConfig::default())
    }

    /// Creates a new OpenAIProvider with custom configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use switchboard_core::provider::openai::{OpenAIConfig, OpenAIProvider};
    /// use switchboard_core::Provider;
    ///
    /// let config = OpenAIConfig {
    ///     api_key: "sk-...".into(),
    ///     base_url: "https://api.deepseek.com".to_string(),
    ///     default_model: "deepseek-chat".to_string(),
    ///     id: "deepseek".to_string(),
    ///     name: "DeepSeek".to_string(),
    ///     ..Default::default()
    /// };
    ///
    /// let provider = OpenAIProvider::with_config(config);
    /// assert_eq!(provider.default_model(), "deepseek-chat");
    /// ```
    #[instrument(skip(config), fields(id = %config.id), level = "debug")]
    pub fn with_config(config: OpenAIConfig) -> Self {
        info!("Creating OpenAI-compatible provider");
        debug!("API key set: {}", !config.api_key.is_empty());
        debug!("Base URL: {}", config.base_url);
        debug!("Organization set: {}", config.organization.is_some());

        let identity = ProviderIdentity::new(&config.name, &config.id);
        let models = config.models.clone().unwrap_or_else(default_models);

        Self {
            config,
            identity,
            models,
            transport: HttpTransport::new(),
        }
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

    /// Creates a request payload from the neutral message list
    fn create_request_payload(&self, request: &CompletionRequest<'_>) -> OpenAIRequest {
        let options = request.options.cloned().unwrap_or_default();
        let model = request
            .model_override()
            .unwrap_or(&self.config.default_model)
            .to_string();
        debug!("Using model ID: {}", model);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system() {
            debug!("Adding system prompt");
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.extend(request.messages.iter().map(OpenAIMessage::from));

        // o-series reasoning models reject max_tokens
        let (max_tokens, max_completion_tokens) = if is_o_series(&model) {
            (None, request.max_tokens())
        } else {
            (request.max_tokens(), None)
        };

        OpenAIRequest {
            model,
            messages,
            max_tokens,
            max_completion_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stream: request.stream.then_some(true),
        }
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn is_o_series(model: &str) -> bool {
    let mut chars = model.chars();
    chars.next() == Some('o') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn default_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo::new("gpt-4o", "GPT-4o").with_description("Flagship multimodal model"),
        ModelInfo::new("gpt-4o-mini", "GPT-4o Mini").with_description("Faster, cheaper GPT-4o"),
        ModelInfo::new("gpt-4-turbo", "GPT-4 Turbo").with_description("GPT-4 Turbo"),
        ModelInfo::new("gpt-3.5-turbo", "GPT-3.5 Turbo").with_description("Fast and economical"),
    ]
}

impl HttpBackend for OpenAIProvider {
    fn accept(&self, request: CompletionRequest<'_>) -> Result<Request> {
        info!("Creating request for {}", self.identity.id);
        debug!("Messages in history: {}", request.messages.len());

        let url_str = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let url = Url::parse(&url_str).map_err(|e| {
            error!("Failed to parse URL '{}': {}", url_str, e);
            Error::from(e)
        })?;

        let mut req = Request::new(Method::POST, url);

        let auth_header: HeaderValue = format!("Bearer {}", self.config.api_key.expose())
            .parse()
            .map_err(|_| Error::Authentication("Invalid API key format".into()))?;
        req.headers_mut().insert("Authorization", auth_header);
        req.headers_mut()
            .insert("Content-Type", HeaderValue::from_static("application/json"));

        if let Some(org) = &self.config.organization {
            match org.parse::<HeaderValue>() {
                Ok(header) => {
                    req.headers_mut().insert("OpenAI-Organization", header);
                }
                Err(e) => {
                    // Continue without organization header
                    warn!("Failed to set organization header: {}", e);
                }
            }
        }

        let payload = self.create_request_payload(&request);
        trace!("Number of messages: {}", payload.messages.len());

        let body_bytes = serde_json::to_vec(&payload)?;
        debug!("Payload serialized ({} bytes)", body_bytes.len());
        *req.body_mut() = Some(body_bytes.into());

        Ok(req)
    }

    fn parse(&self, raw_response_text: String) -> Result<String> {
        trace!("Raw response: {}", raw_response_text);

        if let Ok(OpenAIErrorResponse { error: Some(err) }) =
            serde_json::from_str::<OpenAIErrorResponse>(&raw_response_text)
        {
            error!("OpenAI API returned an error: {}", err.message);
            return Err(Error::Other(err.message));
        }

        let response: OpenAIResponse = serde_json::from_str(&raw_response_text)?;
        if let Some(usage) = &response.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn event_parser(&self) -> EventParser {
        parse_stream_event
    }
}

/// Chunks carry the text at `choices[0].delta.content`
fn parse_stream_event(data: &str) -> Result<Option<String>> {
    let chunk: OpenAIStreamChunk =
        serde_json::from_str(data).map_err(|e| Error::Stream(e.to_string()))?;

    if let Some(err) = chunk.error {
        return Err(Error::Stream(err.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}

#[async_trait]
impl Provider for OpenAIProvider {
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
        self.models.clone()
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    fn set_default_model(&mut self, model: String) {
        info!("{}: default model set to {}", self.identity.id, model);
        self.config.default_model = model;
    }
}

/// Represents a message in the OpenAI API format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

impl From<&ChatMessage> for OpenAIMessage {
    fn from(msg: &ChatMessage) -> Self {
        OpenAIMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Represents a request to the OpenAI API
#[derive(Debug, Serialize)]
pub(crate) struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    /// Maximum number of tokens to generate (for GPT models)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Maximum number of tokens to generate (for O-series models)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Represents a response from the OpenAI API
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIResponse {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// One `chat.completion.chunk` event
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIStreamChunk {
    #[serde(default)]
    pub choices: Vec<OpenAIStreamChoice>,
    pub error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIStreamChoice {
    #[serde(default)]
    pub delta: OpenAIDelta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenAIDelta {
    pub content: Option<String>,
}

/// Represents an error response from the OpenAI API
#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIErrorResponse {
    pub error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAIError {
    pub message: String,
}
