#[derive(thiserror::Error, Debug)]
pub enum NodeTreeError {
    /// Input breaks a structural rule; never retried.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Persistence failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl NodeTreeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn node_not_found(id: uuid::Uuid) -> Self {
        Self::NotFound(format!("node not found: {}", id))
    }
}

pub type NodeTreeResult<T> = Result<T, NodeTreeError>;
