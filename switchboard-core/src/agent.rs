use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{debug, error, info, warn};

use crate::conversation::{ConversationBuffer, DEFAULT_MAX_TURNS};
use crate::error::{Error, Result};
use crate::message::ChatMessage;
use crate::model::SendOptions;
use crate::registry::ProviderRegistry;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Streamed reply from [`Agent::chat_stream`]. Holds the agent mutably until dropped.
pub type ChatStream<'a> = BoxStream<'a, Result<String>>;

/// Settings fixed when an [`Agent`] is created
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub system_prompt: String,
    /// Turns (user + assistant pairs) kept in history
    pub max_turns: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

/// Drives a conversation against whichever provider is current.
///
/// The agent is the only writer of its conversation buffer. A user message is
/// appended before the provider is called. After the call settles the buffer
/// is reconciled: a successful reply is appended; a failed `chat` clears the
/// whole buffer; a failed `chat_stream` keeps whatever text was streamed before
/// the failure.
#[derive(Debug)]
pub struct Agent {
    registry: ProviderRegistry,
    conversation: ConversationBuffer,
    system_prompt: String,
}

impl Agent {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::with_options(registry, AgentOptions::default())
    }

    pub fn with_options(registry: ProviderRegistry, options: AgentOptions) -> Self {
        Self {
            registry,
            conversation: ConversationBuffer::new(options.max_turns),
            system_prompt: options.system_prompt,
        }
    }

    /// Sends `message` with the full history and waits for the complete reply
    ///
    /// # Errors
    ///
    /// [`Error::NoProvider`] if nothing is registered (the buffer is left alone),
    /// otherwise the provider's error. A provider error empties the history.
    pub async fn chat(
        &mut self,
        message: impl Into<String>,
        options: Option<&SendOptions>,
    ) -> Result<String> {
        let Some(provider) = self.registry.current() else {
            error!("chat called with no provider registered");
            return Err(Error::NoProvider);
        };

        self.conversation.add_user(message);
        let history = self.conversation.snapshot();
        debug!(
            "Sending {} messages to '{}'",
            history.len(),
            self.registry.current_id()
        );

        match provider
            .send_message(&history, Some(self.system_prompt.as_str()), options)
            .await
        {
            Ok(reply) => {
                self.conversation.add_assistant(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                warn!("Provider call failed, discarding history: {}", e);
                self.conversation.clear();
                Err(e)
            }
        }
    }

    /// Sends `message` and streams the reply as text fragments.
    ///
    /// When the stream finishes, the concatenated fragments become the assistant
    /// turn. If the provider fails part way, the text received so far is still
    /// committed (when non-empty) and the error is the stream's last item.
    /// Dropping the stream early leaves the user message in history.
    pub fn chat_stream<'a>(
        &'a mut self,
        message: impl Into<String>,
        options: Option<&'a SendOptions>,
    ) -> ChatStream<'a> {
        let message = message.into();
        let Agent {
            registry,
            conversation,
            system_prompt,
        } = self;

        Box::pin(async_stream::stream! {
            let Some(provider) = registry.current() else {
                error!("chat_stream called with no provider registered");
                yield Err(Error::NoProvider);
                return;
            };

            conversation.add_user(message);
            let history = conversation.snapshot();
            info!("Streaming reply from '{}'", provider.id());

            let mut accumulated = String::new();
            let failure = match provider
                .stream_message(&history, Some(system_prompt.as_str()), options)
                .await
            {
                Ok(mut fragments) => {
                    let mut failure = None;
                    while let Some(item) = fragments.next().await {
                        match item {
                            Ok(text) => {
                                accumulated.push_str(&text);
                                yield Ok(text);
                            }
                            Err(e) => {
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                    failure
                }
                Err(e) => Some(e),
            };

            match failure {
                None => conversation.add_assistant(accumulated),
                Some(e) => {
                    warn!(
                        "Stream failed after {} bytes, keeping partial reply: {}",
                        accumulated.len(),
                        e
                    );
                    if !accumulated.is_empty() {
                        conversation.add_assistant(accumulated);
                    }
                    yield Err(e);
                }
            }
        })
    }

    /// Makes `id` the current provider and clears history. Returns false, leaving
    /// history alone, if `id` is not registered.
    pub fn switch_provider(&mut self, id: &str) -> bool {
        if !self.registry.set_current(id) {
            return false;
        }
        self.conversation.clear();
        true
    }

    /// Changes the default model of the current provider. Does nothing if there is none.
    pub fn switch_model(&mut self, model: impl Into<String>) {
        match self.registry.current_mut() {
            Some(provider) => provider.set_default_model(model.into()),
            None => debug!("switch_model ignored: no current provider"),
        }
    }

    pub fn clear_history(&mut self) {
        self.conversation.clear();
    }

    /// Number of messages (not turns) in history
    pub fn history_len(&self) -> usize {
        self.conversation.len()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.conversation.snapshot()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn current_provider_name(&self) -> Option<&str> {
        self.registry.current().map(|p| p.name())
    }

    pub fn current_model(&self) -> Option<&str> {
        self.registry.current().map(|p| p.default_model())
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Mutable access for registering more providers. Switching through here
    /// does not clear history; use [`switch_provider`](Self::switch_provider) for that.
    pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.registry
    }
}
