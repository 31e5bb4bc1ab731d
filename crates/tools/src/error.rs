use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("tool {0:?} is not registered")]
    NotFound(String),

    #[error("parameter validation failed: {0}")]
    Validation(String),

    #[error("tool handler failed: {0}")]
    Internal(String),
}
