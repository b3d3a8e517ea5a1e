use thiserror::Error;

/// Everything that can go wrong between the input box and the chat endpoint.
///
/// All of these are absorbed at the dispatch boundary: the transcript only
/// ever shows a generic apology, while the concrete variant is logged.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Config(String),
}
