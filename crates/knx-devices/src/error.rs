use knx_dpt::DptError;
use knx_telegram::{GroupAddress, TransportError};
use thiserror::Error;

pub type Result<T, E = DeviceError> = core::result::Result<T, E>;

/// Error a device update callback may return; logged, never propagated.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Dpt(#[from] DptError),
    #[error("no answer for {0} before the read timeout")]
    ReadTimeout(GroupAddress),
    #[error("device {0} does not accept values")]
    ReadOnly(String),
    #[error("configuration error: {0}")]
    Config(String),
}
