use std::fmt;

use crate::compactor::{DropOldestTurns, HistoryCompactor};
use crate::message::ChatMessage;

/// Turns retained when no explicit bound is given
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Ordered, bounded log of conversation turns.
///
/// Every append runs the trim policy, so the buffer never holds more than
/// `2 * max_turns` messages. The oldest messages are evicted first.
pub struct ConversationBuffer {
    messages: Vec<ChatMessage>,
    max_turns: usize,
    compactor: Box<dyn HistoryCompactor>,
}

impl ConversationBuffer {
    /// Creates an empty buffer that keeps at most `max_turns` user/assistant pairs
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
            compactor: Box::new(DropOldestTurns::new(max_turns)),
        }
    }

    /// Replaces the trim policy. The buffer is compacted immediately.
    #[must_use]
    pub fn with_compactor<C: HistoryCompactor + 'static>(mut self, compactor: C) -> Self {
        self.compactor = Box::new(compactor);
        self.compactor.compact(&mut self.messages);
        self
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    fn push(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
        self.compactor.compact(&mut self.messages);
    }

    /// Returns an owned copy of the full history, oldest first
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// Returns the last `n` messages (or all of them when fewer are held)
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].to_vec()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages held (not turns)
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl fmt::Debug for ConversationBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationBuffer")
            .field("messages", &self.messages)
            .field("max_turns", &self.max_turns)
            .finish_non_exhaustive()
    }
}
