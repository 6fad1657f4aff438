// This is the main library file that re-exports the public API
// and defines the module structure.

pub mod agent;
pub mod compactor;
pub mod conversation;
pub mod error;
pub mod message;
pub mod model;
pub mod provider;
pub mod registry;
pub mod secret;
pub mod transport;

// Re-export the main types for convenient usage
pub use agent::{Agent, AgentOptions, ChatStream, DEFAULT_SYSTEM_PROMPT};
pub use compactor::{DropOldestTurns, HistoryCompactor};
pub use conversation::{ConversationBuffer, DEFAULT_MAX_TURNS};
pub use error::{Error, Result};
pub use message::{ChatMessage, Role};
pub use model::{ModelInfo, SendOptions};
pub use provider::{Provider, ProviderIdentity, TextStream};
pub use registry::{ProviderRegistry, ProviderSummary};
pub use secret::Secret;
pub use transport::HttpTransport;
