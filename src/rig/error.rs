use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigError {
    #[error("connection failed: {0}")]
    Connect(std::io::Error),
    #[error("read timed out")]
    Timeout,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("device reported error: {status}")]
    Device { status: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
