//! Gateway-wide failure taxonomy.
//!
//! Mirrors the teacher's per-crate `ServerError` pattern (one thiserror enum
//! per boundary, mapped to a transport-level status), extended with the
//! categories spec's Error Handling Design requires.

use thiserror::Error;

/// Top-level error categories a connection or session can surface.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("illegal phase transition: {0}")]
    IllegalTransition(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("tool error: {0}")]
    Tool(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("model stream reset")]
    ModelStreamReset,

    #[error("model stream error: {0}")]
    ModelStreamOther(String),

    #[error("resource exhausted: {0}")]
    Resource(String),

    #[error("internal invariant violated: {0}")]
    Fatal(String),
}

impl GatewayError {
    /// True for the two categories that tear a session down but are not
    /// bugs in the gateway itself (see Error Handling Design, propagation
    /// policy).
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            GatewayError::IllegalTransition(_)
                | GatewayError::ModelStreamReset
                | GatewayError::ModelStreamOther(_)
                | GatewayError::Resource(_)
                | GatewayError::Fatal(_)
        )
    }
}

impl From<GatewayError> for axum::http::StatusCode {
    fn from(err: GatewayError) -> Self {
        use axum::http::StatusCode;
        match err {
            GatewayError::Protocol(_) => StatusCode::BAD_REQUEST,
            GatewayError::IllegalTransition(_) => StatusCode::BAD_REQUEST,
            GatewayError::Authentication(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Tool(_) => StatusCode::OK, // surfaced in-band, not as HTTP
            GatewayError::Repository(_) => StatusCode::OK,
            GatewayError::ModelStreamReset => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::ModelStreamOther(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Resource(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
