//! knx-devices: device dispatch and state synchronization over a KNX group bus
//!
//! A [`Device`] owns one or more remote values, routes group telegrams to them
//! and notifies update callbacks when its state changes. [`Devices`] routes
//! inbound telegrams to every device listening on the destination address.

mod error;
pub use error::{CallbackError, DeviceError, Result};

pub mod remote_value;
pub use remote_value::{GroupValue, RemoteValue, StateUpdater};

mod callbacks;
pub use callbacks::{CallbackId, UpdateCallbacks};

mod device;
pub use device::{Device, DeviceBehavior, DeviceKind};

mod sensor;
pub use sensor::{ExposeSensor, Sensor};

mod devices;
pub use devices::Devices;

mod loader;
pub use loader::{
    load_config_file, load_config_str, DeviceConfig, DeviceKindConfig, DevicesConfig,
};

mod metrics;
pub use metrics::{DeviceMetrics, MetricsHub};
