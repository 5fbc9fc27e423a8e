use thiserror::Error;

/// Page retrieval failed. The feed keeps its last stable state.
#[derive(Debug, Error)]
#[error("failed to fetch feed page: {0:#}")]
pub struct FetchError(#[from] pub anyhow::Error);

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("you must be signed in to comment")]
    MissingAuthor,
    #[error("comment content must be non-empty")]
    EmptyContent,
    #[error("comment service error: {0:#}")]
    Service(#[from] anyhow::Error),
}

impl CommentError {
    /// Validation failures belong next to the form field, not in a banner.
    pub fn is_validation(&self) -> bool {
        matches!(self, CommentError::MissingAuthor | CommentError::EmptyContent)
    }
}
