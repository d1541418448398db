use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
