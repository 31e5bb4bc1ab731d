use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to connect to model endpoint: {0}")]
    ConnectFailed(String),

    #[error("model stream reset")]
    Reset,

    #[error("model stream error: {0}")]
    Other(String),
}

impl ModelError {
    /// Distinguishes a "closed stream / idle" condition — mapped to
    /// `sessionTimeout` by the worker — from any other read failure.
    pub fn is_reset(&self) -> bool {
        matches!(self, ModelError::Reset)
    }

    /// Classifies a raw tungstenite error as reset-like vs. other, based on
    /// the close/IO conditions that indicate the remote end dropped or
    /// idled out the stream.
    pub fn from_ws_error(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => ModelError::Reset,
            WsError::Io(ref io_err)
                if matches!(
                    io_err.kind(),
                    std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::UnexpectedEof
                ) =>
            {
                ModelError::Reset
            }
            other => ModelError::Other(other.to_string()),
        }
    }
}
