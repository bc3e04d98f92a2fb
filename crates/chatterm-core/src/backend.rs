use async_trait::async_trait;

use crate::error::ChatError;

/// Result of an exchange that reached the chat service and was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeReply {
    /// The assistant's answer
    Reply(String),
    /// The service reported an application-level error
    Failed(String),
}

/// The remote collaborator a session talks to.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask the service to forget its conversation memory.
    async fn reset(&self) -> Result<(), ChatError>;

    /// Send one user message and wait for the reply.
    async fn exchange(&self, message: &str) -> Result<ExchangeReply, ChatError>;
}
