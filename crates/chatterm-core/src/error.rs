use std::path::PathBuf;

/// Failures talking to the chat service.
///
/// Application-level errors reported by the service in an otherwise valid
/// reply are not errors here; see [`crate::ExchangeReply::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat service returned status {0}")]
    Status(u16),
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("exchange aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
