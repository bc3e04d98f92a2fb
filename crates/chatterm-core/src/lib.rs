pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use backend::{ChatBackend, ExchangeReply};
pub use client::{ChatClient, DEFAULT_SERVER_URL};
pub use config::Config;
pub use error::{ChatError, ConfigError};
pub use logging::init_logging;
pub use session::{Exchange, ExchangeOutcome, Session, CONNECTION_FAILED_TEXT, ERROR_PREFIX};
pub use state::{ConversationLog, Message, MessageId, Sender, SessionState};
