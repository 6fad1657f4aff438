//! In-process providers for exercising the agent without a network

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use switchboard_core::{
    ChatMessage, Error, ModelInfo, Provider, ProviderIdentity, Result, Role, SendOptions,
    TextStream,
};

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Replies with the latest user message
    Echo,
    /// Replies with the latest user message in upper case
    Uppercase,
    /// Fails every call with a 500
    Fail,
    /// Streams the given fragments, then fails if `error` is set
    Script {
        fragments: Vec<String>,
        error: Option<String>,
    },
}

/// Every message list a [`StubProvider`] was called with, shared with the test
pub type CallLog = Arc<Mutex<Vec<Vec<ChatMessage>>>>;

pub struct StubProvider {
    identity: ProviderIdentity,
    model: String,
    behavior: Behavior,
    calls: CallLog,
    system_prompts: Arc<Mutex<Vec<Option<String>>>>,
}

#[allow(dead_code)]
impl StubProvider {
    pub fn new(id: &str, behavior: Behavior) -> Self {
        Self {
            identity: ProviderIdentity::new(format!("Stub {}", id), id),
            model: format!("{}-model", id),
            behavior,
            calls: CallLog::default(),
            system_prompts: Arc::default(),
        }
    }

    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    pub fn system_prompts(&self) -> Arc<Mutex<Vec<Option<String>>>> {
        Arc::clone(&self.system_prompts)
    }

    pub fn boxed(self) -> Box<dyn Provider> {
        Box::new(self)
    }

    fn record(&self, messages: &[ChatMessage], system_prompt: Option<&str>) {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.system_prompts
            .lock()
            .unwrap()
            .push(system_prompt.map(str::to_string));
    }

    fn last_user(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    fn failure() -> Error {
        Error::Api {
            status: 500,
            message: "stub failure".into(),
        }
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn identity(&self) -> &ProviderIdentity {
        &self.identity
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        _options: Option<&SendOptions>,
    ) -> Result<String> {
        self.record(messages, system_prompt);
        match &self.behavior {
            Behavior::Echo => Ok(Self::last_user(messages)),
            Behavior::Uppercase => Ok(Self::last_user(messages).to_uppercase()),
            Behavior::Fail => Err(Self::failure()),
            Behavior::Script { fragments, error } => match error {
                Some(e) => Err(Error::Stream(e.clone())),
                None => Ok(fragments.concat()),
            },
        }
    }

    async fn stream_message(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        _options: Option<&SendOptions>,
    ) -> Result<TextStream> {
        self.record(messages, system_prompt);
        let items: Vec<Result<String>> = match &self.behavior {
            Behavior::Echo => vec![Ok(Self::last_user(messages))],
            Behavior::Uppercase => vec![Ok(Self::last_user(messages).to_uppercase())],
            Behavior::Fail => return Err(Self::failure()),
            Behavior::Script { fragments, error } => fragments
                .iter()
                .cloned()
                .map(Ok)
                .chain(error.iter().map(|e| Err(Error::Stream(e.clone()))))
                .collect(),
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo::new(&self.model, "Stub model")]
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn set_default_model(&mut self, model: String) {
        self.model = model;
    }
}
