use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("schema error: {0}")]
    SchemaError(String),

    #[error("invalid stored data: {0}")]
    InvalidData(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<scylla::transport::errors::QueryError> for RepositoryError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        RepositoryError::Backend(err.to_string())
    }
}

impl From<scylla::transport::errors::NewSessionError> for RepositoryError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        RepositoryError::Backend(err.to_string())
    }
}
