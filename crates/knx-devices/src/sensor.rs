use crate::device::DeviceBehavior;
use crate::remote_value::{GroupValue, RemoteValue};
use crate::{DeviceError, Result};
use async_trait::async_trait;
use knx_dpt::DptValue;
use knx_telegram::Telegram;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Read-only value taken from the bus.
pub struct Sensor {
    value: GroupValue,
    always_callback: bool,
    poll_interval: Option<Duration>,
}

impl Sensor {
    pub fn new(value: GroupValue) -> Self {
        Self {
            value,
            always_callback: false,
            poll_interval: None,
        }
    }

    /// Notify on every write, even when the value did not change.
    pub fn with_always_callback(mut self, always_callback: bool) -> Self {
        self.always_callback = always_callback;
        self
    }

    /// Send a periodic read to the state address. A zero interval disables polling.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn value(&self) -> Option<&DptValue> {
        self.value.value()
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.value.unit()
    }

    pub fn remote_value(&self) -> &GroupValue {
        &self.value
    }
}

#[async_trait]
impl DeviceBehavior for Sensor {
    fn remote_values(&self) -> Vec<&dyn RemoteValue> {
        vec![&self.value as &dyn RemoteValue]
    }

    fn remote_values_mut(&mut self) -> Vec<&mut dyn RemoteValue> {
        vec![&mut self.value as &mut dyn RemoteValue]
    }

    async fn process_group_write(&mut self, telegram: &Telegram) -> Result<bool> {
        let changed = self.value.process(telegram)?;
        Ok(changed || (self.always_callback && self.value.has_group_address(telegram.destination)))
    }

    fn start_tasks(
        &mut self,
        device_name: &str,
        runtime: Option<&Handle>,
    ) -> Result<Vec<JoinHandle<()>>> {
        let (Some(period), Some(address)) = (self.poll_interval, self.value.state_address()) else {
            return Ok(Vec::new());
        };
        let Some(runtime) = runtime else {
            return Err(DeviceError::Config(format!(
                "device {device_name:?} polls the bus but no tokio runtime is running"
            )));
        };
        let bus = self.value.bus();
        let device = device_name.to_string();
        tracing::debug!(%device, %address, ?period, "starting sensor poll task");
        Ok(vec![runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = bus.send(Telegram::read(address)).await {
                    tracing::warn!(%device, %address, "poll read failed: {e}");
                }
            }
        })])
    }
}

/// Local value published to the bus and answered on group reads.
pub struct ExposeSensor {
    value: GroupValue,
}

impl ExposeSensor {
    pub fn new(value: GroupValue) -> Self {
        Self { value }
    }

    /// Write `value` to the bus; `Ok(true)` when it differs from the last one.
    pub async fn set(&mut self, value: DptValue) -> Result<bool> {
        self.value.set(value).await
    }

    pub fn value(&self) -> Option<&DptValue> {
        self.value.value()
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.value.unit()
    }

    pub fn remote_value(&self) -> &GroupValue {
        &self.value
    }
}

#[async_trait]
impl DeviceBehavior for ExposeSensor {
    fn remote_values(&self) -> Vec<&dyn RemoteValue> {
        vec![&self.value as &dyn RemoteValue]
    }

    fn remote_values_mut(&mut self) -> Vec<&mut dyn RemoteValue> {
        vec![&mut self.value as &mut dyn RemoteValue]
    }

    async fn process_group_write(&mut self, telegram: &Telegram) -> Result<bool> {
        self.value.process(telegram)
    }

    async fn process_group_read(&mut self, telegram: &Telegram) -> Result<()> {
        if self.value.group_address() == Some(telegram.destination) {
            self.value.respond().await?;
        }
        Ok(())
    }
}
