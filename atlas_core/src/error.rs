use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for `atlas_core`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A locator string that does not name a grid coordinate pair.
    #[error("invalid locator: {0:?}")]
    InvalidLocator(String),

    /// Entity referenced by the history log but absent from the content store.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The current epoch was interrupted by shutdown.
    #[error("indexing cancelled")]
    Cancelled,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}
