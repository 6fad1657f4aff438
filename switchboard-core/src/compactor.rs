use crate::message::ChatMessage;

/// Trait for compacting chat history
pub trait HistoryCompactor: Send + Sync {
    /// Compacts the chat history in place so it fits the policy's bound.
    fn compact(&self, history: &mut Vec<ChatMessage>);
}

/// Compactor that keeps the most recent `max_turns` user/assistant pairs,
/// dropping the oldest messages first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOldestTurns {
    max_turns: usize,
}

impl DropOldestTurns {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Upper bound on retained messages (one user and one assistant message per turn)
    pub fn max_messages(&self) -> usize {
        self.max_turns.saturating_mul(2)
    }
}

impl HistoryCompactor for DropOldestTurns {
    fn compact(&self, history: &mut Vec<ChatMessage>) {
        let limit = self.max_messages();
        if history.len() <= limit {
            return;
        }

        let excess = history.len() - limit;
        history.drain(..excess);
    }
}
