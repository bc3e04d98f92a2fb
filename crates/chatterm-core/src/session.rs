//! Conversation session controller
//!
//! A [`Session`] owns the message log, the pending input and the busy flag.
//! Submitting is split in two so a front end can run the request on a
//! background task and keep handling input:
//!
//! 1. [`Session::begin_submit`] checks and sets `busy`, appends the user
//!    message and hands out an [`Exchange`].
//! 2. The caller awaits [`Exchange::send`] wherever it likes.
//! 3. [`Session::finish_submit`] folds the outcome into the log and clears
//!    `busy`, whatever the outcome was.
//!
//! [`Session::submit`] runs all three steps in place.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::{ChatBackend, ExchangeReply};
use crate::error::ChatError;
use crate::state::{ConversationLog, MessageId, Sender, SessionState};

/// Assistant text used when the chat service could not be reached or its
/// reply could not be understood.
pub const CONNECTION_FAILED_TEXT: &str = "Failed to connect to the server. Please try again.";

/// Prefix for application errors reported by the chat service.
pub const ERROR_PREFIX: &str = "Error: ";

pub type ExchangeOutcome = Result<ExchangeReply, ChatError>;

pub struct Session<B> {
    backend: Arc<B>,
    log: ConversationLog,
    state: SessionState,
}

/// An accepted submission whose reply is still outstanding
pub struct Exchange<B> {
    backend: Arc<B>,
    user_message: MessageId,
    text: String,
}

impl<B: ChatBackend> Exchange<B> {
    pub fn user_message(&self) -> MessageId {
        self.user_message
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Perform the round trip. Never touches session state.
    pub async fn send(self) -> ExchangeOutcome {
        self.backend.exchange(&self.text).await
    }
}

impl<B: ChatBackend> Session<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            log: ConversationLog::new(),
            state: SessionState::default(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    pub fn pending_input(&self) -> &str {
        &self.state.pending_input
    }

    pub fn update_pending_input(&mut self, text: impl Into<String>) {
        self.state.pending_input = text.into();
    }

    /// Accept `text` as the next user turn.
    ///
    /// Returns `None` without touching any state when the text is blank or
    /// an exchange is already outstanding.
    pub fn begin_submit(&mut self, text: &str) -> Option<Exchange<B>> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring blank submission");
            return None;
        }
        if self.state.busy {
            tracing::debug!("ignoring submission while an exchange is outstanding");
            return None;
        }

        let user_message = self.log.append(Sender::User, text);
        self.state.pending_input.clear();
        self.state.busy = true;
        tracing::info!(id = user_message.get(), chars = text.chars().count(), "sending message");

        Some(Exchange {
            backend: Arc::clone(&self.backend),
            user_message,
            text: text.to_string(),
        })
    }

    /// Submit whatever is in the pending input buffer.
    pub fn begin_submit_pending(&mut self) -> Option<Exchange<B>> {
        let text = self.state.pending_input.clone();
        self.begin_submit(&text)
    }

    /// Fold the outcome of the outstanding exchange into the log.
    ///
    /// Always leaves the session idle. Returns the id of the assistant
    /// message, or `None` if no exchange was outstanding.
    pub fn finish_submit(&mut self, outcome: ExchangeOutcome) -> Option<MessageId> {
        if !self.state.busy {
            tracing::warn!("dropping exchange outcome with no exchange outstanding");
            return None;
        }
        self.state.busy = false;

        let text = match outcome {
            Ok(ExchangeReply::Reply(text)) => text,
            Ok(ExchangeReply::Failed(error)) => {
                tracing::warn!(%error, "chat service reported an error");
                format!("{}{}", ERROR_PREFIX, error)
            }
            Err(e) => {
                tracing::error!(error = %e, "exchange failed");
                CONNECTION_FAILED_TEXT.to_string()
            }
        };

        Some(self.log.append(Sender::Assistant, text))
    }

    /// Submit `text` and wait for the reply in place.
    pub async fn submit(&mut self, text: &str) -> Option<MessageId> {
        let exchange = self.begin_submit(text)?;
        let outcome = exchange.send().await;
        self.finish_submit(outcome)
    }
}

impl<B: ChatBackend + 'static> Session<B> {
    /// Ask the chat service to forget previous conversations.
    ///
    /// Best effort: the reset runs on its own task, failures are only logged
    /// and nothing about the session waits for it.
    pub fn initialize(&self) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            match backend.reset().await {
                Ok(()) => tracing::info!("chat service memory reset"),
                Err(e) => tracing::warn!(error = %e, "could not reset chat service memory"),
            }
        })
    }
}
