use thiserror::Error;

/// Errors returned by `PostStore` operations.
///
/// None of them leave the store in a bad state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Post with id {0} not found.")]
    NotFound(u32),

    #[error("Wrong params provided.")]
    InvalidParameter,

    #[error("No free post id left.")]
    OutOfIdentifiers,

    #[error("Duplicate post id {0}.")]
    DuplicateId(u32),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> StoreError {
        StoreError::Validation(message.into())
    }
}
