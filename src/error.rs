use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("Table '{0}' not available")]
    StoreUnavailable(String),

    #[error("Delete failed: {0}")]
    DeleteFailure(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type ExploreResult<T> = Result<T, ExploreError>;

impl ExploreError {
    /// Whether the error means "the table simply isn't there yet".
    /// Facet evaluators surface this as an empty result instead of failing.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, ExploreError::StoreUnavailable(_))
    }
}
