use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid group address: {0}")]
    InvalidAddress(String),
    #[error("bus connection closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(String),
}
