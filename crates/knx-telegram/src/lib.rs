//! knx-telegram: KNX group addressing and bus transport abstractions
//!
//! This crate provides the telegram model shared by the transcoding and device layers,
//! and an async transport trait. The default build enables a `mock` backend so that
//! device logic can be exercised on any host without a KNX/IP gateway.

mod types;
pub use types::{GroupAddress, Payload, Telegram, Timestamp};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::GroupBus;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockBus;
