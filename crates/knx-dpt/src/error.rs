use thiserror::Error;

pub type Result<T, E = DptError> = core::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DptError {
    #[error("no transcoder found for {0}")]
    NotFound(String),
    #[error("invalid value for {value_type}: {reason}")]
    InvalidValue {
        value_type: &'static str,
        reason: String,
    },
    #[error("invalid payload length for {value_type}: expected {expected} bytes, got {actual}")]
    InvalidPayloadLength {
        value_type: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid payload for {value_type}: {reason}")]
    InvalidPayload {
        value_type: &'static str,
        reason: String,
    },
    #[error("duplicate value_type in transcoder table: {0}")]
    DuplicateValueType(&'static str),
    #[error("duplicate DPT number in transcoder table: {0}")]
    DuplicateDptId(String),
}
