use crate::metrics::DeviceMetrics;
use crate::remote_value::{GroupValue, StateUpdater, DEFAULT_READ_TIMEOUT};
use crate::sensor::{ExposeSensor, Sensor};
use crate::{Device, DeviceKind, Devices, Result};
use anyhow::Context;
use knx_telegram::{GroupAddress, GroupBus};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesConfig {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    /// Read timeout applied to every remote value, in milliseconds.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: DeviceKindConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceKindConfig {
    Sensor {
        /// `value_type` or DPT notation such as `9.001`.
        value_type: String,
        state_address: GroupAddress,
        #[serde(default = "default_true")]
        sync_state: bool,
        #[serde(default)]
        always_callback: bool,
        #[serde(default)]
        poll_interval_secs: Option<u64>,
        #[serde(default)]
        passive_addresses: Vec<GroupAddress>,
    },
    ExposeSensor {
        value_type: String,
        address: GroupAddress,
    },
}

fn default_true() -> bool {
    true
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<DevicesConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading device config: {}", path.display()))?;
    load_config_str(&raw).with_context(|| format!("loading device config: {}", path.display()))
}

pub fn load_config_str(raw: &str) -> anyhow::Result<DevicesConfig> {
    let config: DevicesConfig = serde_yaml::from_str(raw).context("parsing yaml")?;
    Ok(config)
}

impl DevicesConfig {
    /// Resolve transcoders and construct every device against `bus`.
    pub fn build(
        &self,
        bus: Arc<dyn GroupBus>,
        state_updater: Option<Arc<dyn StateUpdater>>,
        metrics: Option<DeviceMetrics>,
    ) -> Result<Devices> {
        let timeout = self
            .read_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_READ_TIMEOUT);
        let mut devices = match metrics {
            Some(m) => Devices::new().with_metrics(m),
            None => Devices::new(),
        };
        // build everything first; nothing is registered until the config resolves
        let built = self
            .devices
            .iter()
            .map(|config| {
                let kind = config.build_kind(&bus, state_updater.as_ref(), timeout)?;
                Ok(Device::new(config.name.clone(), kind))
            })
            .collect::<Result<Vec<_>>>()?;
        for device in built {
            if let Err(e) = devices.add(device) {
                devices.clear();
                return Err(e);
            }
        }
        tracing::info!(devices = devices.len(), "device configuration loaded");
        Ok(devices)
    }
}

impl DeviceConfig {
    fn build_kind(
        &self,
        bus: &Arc<dyn GroupBus>,
        state_updater: Option<&Arc<dyn StateUpdater>>,
        timeout: Duration,
    ) -> Result<DeviceKind> {
        let kind = match &self.kind {
            DeviceKindConfig::Sensor {
                value_type,
                state_address,
                sync_state,
                always_callback,
                poll_interval_secs,
                passive_addresses,
            } => {
                let transcoder = knx_dpt::parse_transcoder(value_type)?;
                let mut value = GroupValue::new(transcoder, Arc::clone(bus))
                    .with_state_address(*state_address)
                    .with_passive_addresses(passive_addresses.clone())
                    .with_sync_state(*sync_state)
                    .with_read_timeout(timeout);
                if let Some(updater) = state_updater {
                    value = value.with_state_updater(Arc::clone(updater));
                }
                let mut sensor = Sensor::new(value).with_always_callback(*always_callback);
                if let Some(secs) = poll_interval_secs {
                    sensor = sensor.with_poll_interval(Duration::from_secs(*secs));
                }
                DeviceKind::Sensor(sensor)
            }
            DeviceKindConfig::ExposeSensor {
                value_type,
                address,
            } => {
                let transcoder = knx_dpt::parse_transcoder(value_type)?;
                let value = GroupValue::new(transcoder, Arc::clone(bus))
                    .with_group_address(*address)
                    .with_read_timeout(timeout);
                DeviceKind::ExposeSensor(ExposeSensor::new(value))
            }
        };
        Ok(kind)
    }
}
