//! UI-agnostic conversation state types
//!
//! These types are shared between the session controller and any front end
//! that renders it. They don't depend on a UI framework.

use serde::{Deserialize, Serialize};

/// Identifier of a message in the conversation log.
///
/// Ids are handed out by [`ConversationLog`] in strictly increasing order, so
/// comparing two ids tells which message was appended first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
}

/// Append-only, ordered list of messages. Insertion order is display order.
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its freshly allocated id.
    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            sender,
            text: text.into(),
        });
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Input buffer and single-flight flag of a session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub pending_input: String,
    pub busy: bool,
}
