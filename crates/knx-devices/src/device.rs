use crate::callbacks::{CallbackId, UpdateCallbacks};
use crate::remote_value::RemoteValue;
use crate::sensor::{ExposeSensor, Sensor};
use crate::{CallbackError, DeviceError, Result};
use async_trait::async_trait;
use knx_dpt::DptValue;
use knx_telegram::{GroupAddress, Payload, Telegram};
use prometheus::IntCounter;
use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Per-variant behavior behind a [`Device`].
#[async_trait]
pub trait DeviceBehavior: Send + Sync {
    /// Remote values in a fixed order; sync reads them in this order.
    fn remote_values(&self) -> Vec<&dyn RemoteValue>;

    fn remote_values_mut(&mut self) -> Vec<&mut dyn RemoteValue>;

    /// Returns whether device state changed.
    async fn process_group_write(&mut self, _telegram: &Telegram) -> Result<bool> {
        Ok(false)
    }

    async fn process_group_response(&mut self, telegram: &Telegram) -> Result<bool> {
        self.process_group_write(telegram).await
    }

    async fn process_group_read(&mut self, _telegram: &Telegram) -> Result<()> {
        Ok(())
    }

    /// Spawn background work on `runtime`; `None` when no tokio runtime is running.
    fn start_tasks(
        &mut self,
        _device_name: &str,
        _runtime: Option<&Handle>,
    ) -> Result<Vec<JoinHandle<()>>> {
        Ok(Vec::new())
    }
}

pub enum DeviceKind {
    Sensor(Sensor),
    ExposeSensor(ExposeSensor),
}

impl DeviceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceKind::Sensor(_) => "sensor",
            DeviceKind::ExposeSensor(_) => "expose_sensor",
        }
    }

    fn behavior(&self) -> &dyn DeviceBehavior {
        match self {
            DeviceKind::Sensor(s) => s,
            DeviceKind::ExposeSensor(e) => e,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn DeviceBehavior {
        match self {
            DeviceKind::Sensor(s) => s,
            DeviceKind::ExposeSensor(e) => e,
        }
    }
}

#[async_trait]
impl DeviceBehavior for DeviceKind {
    fn remote_values(&self) -> Vec<&dyn RemoteValue> {
        self.behavior().remote_values()
    }

    fn remote_values_mut(&mut self) -> Vec<&mut dyn RemoteValue> {
        self.behavior_mut().remote_values_mut()
    }

    async fn process_group_write(&mut self, telegram: &Telegram) -> Result<bool> {
        self.behavior_mut().process_group_write(telegram).await
    }

    async fn process_group_response(&mut self, telegram: &Telegram) -> Result<bool> {
        self.behavior_mut().process_group_response(telegram).await
    }

    async fn process_group_read(&mut self, telegram: &Telegram) -> Result<()> {
        self.behavior_mut().process_group_read(telegram).await
    }

    fn start_tasks(
        &mut self,
        device_name: &str,
        runtime: Option<&Handle>,
    ) -> Result<Vec<JoinHandle<()>>> {
        self.behavior_mut().start_tasks(device_name, runtime)
    }
}

impl From<Sensor> for DeviceKind {
    fn from(sensor: Sensor) -> Self {
        DeviceKind::Sensor(sensor)
    }
}

impl From<ExposeSensor> for DeviceKind {
    fn from(sensor: ExposeSensor) -> Self {
        DeviceKind::ExposeSensor(sensor)
    }
}

/// A named device: routes telegrams to its remote values and notifies
/// registered callbacks after every state change.
pub struct Device {
    name: String,
    kind: DeviceKind,
    callbacks: UpdateCallbacks,
    tasks: Vec<JoinHandle<()>>,
}

impl Device {
    pub fn new(name: impl Into<String>, kind: impl Into<DeviceKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            callbacks: UpdateCallbacks::default(),
            tasks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub async fn process(&mut self, telegram: &Telegram) -> Result<()> {
        let changed = match &telegram.payload {
            Payload::GroupValueWrite(_) => self.kind.process_group_write(telegram).await?,
            Payload::GroupValueResponse(_) => self.kind.process_group_response(telegram).await?,
            Payload::GroupValueRead => {
                self.kind.process_group_read(telegram).await?;
                false
            }
            other => {
                tracing::debug!(device = %self.name, ?other, "ignoring telegram");
                false
            }
        };
        if changed {
            self.after_update().await;
        }
        Ok(())
    }

    /// Read every remote value's state in order. Failed reads are logged and
    /// skipped; callbacks run once if anything changed.
    pub async fn sync(&mut self, wait_for_result: bool) {
        tracing::debug!(device = %self.name, wait_for_result, "syncing device state");
        let changed = read_states(&self.name, self.kind.remote_values_mut(), wait_for_result).await;
        if changed {
            self.after_update().await;
        }
    }

    pub fn register_state_updater(&self) {
        for value in self.kind.remote_values() {
            value.register_state_updater();
        }
    }

    pub fn unregister_state_updater(&self) {
        for value in self.kind.remote_values() {
            value.unregister_state_updater();
        }
    }

    /// Every call adds a new entry, even for the same callback.
    pub fn register_device_updated_cb<F, Fut>(&mut self, callback: F) -> CallbackId
    where
        F: Fn(&Device) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), CallbackError>> + Send + 'static,
    {
        self.callbacks.register(callback)
    }

    pub fn unregister_device_updated_cb(&mut self, id: CallbackId) -> bool {
        self.callbacks.unregister(id)
    }

    pub(crate) fn attach_failure_counter(&mut self, counter: IntCounter) {
        self.callbacks.set_failure_counter(counter);
    }

    /// Run all update callbacks concurrently and wait for them.
    pub async fn after_update(&self) {
        self.callbacks.notify(self).await;
    }

    pub fn has_group_address(&self, address: GroupAddress) -> bool {
        self.kind
            .remote_values()
            .iter()
            .any(|value| value.has_group_address(address))
    }

    pub fn group_addresses(&self) -> Vec<GroupAddress> {
        self.kind
            .remote_values()
            .iter()
            .flat_map(|value| value.group_addresses())
            .collect()
    }

    /// Start background tasks on the current tokio runtime. Fails with
    /// [`DeviceError::Config`] when the device needs one and none is running.
    pub fn start_tasks(&mut self) -> Result<()> {
        let runtime = Handle::try_current().ok();
        let tasks = self.kind.start_tasks(&self.name, runtime.as_ref())?;
        self.tasks.extend(tasks);
        Ok(())
    }

    /// Cancel background tasks and wait until they are gone.
    pub async fn remove_tasks(&mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            match task.await {
                Err(e) if !e.is_cancelled() => {
                    tracing::warn!(device = %self.name, "background task failed: {e}")
                }
                _ => {}
            }
        }
    }

    /// Publish a value from an expose sensor.
    pub async fn set_value(&mut self, value: DptValue) -> Result<()> {
        let changed = match &mut self.kind {
            DeviceKind::ExposeSensor(sensor) => sensor.set(value).await?,
            DeviceKind::Sensor(_) => return Err(DeviceError::ReadOnly(self.name.clone())),
        };
        if changed {
            self.after_update().await;
        }
        Ok(())
    }

    pub fn value(&self) -> Option<&DptValue> {
        match &self.kind {
            DeviceKind::Sensor(s) => s.value(),
            DeviceKind::ExposeSensor(e) => e.value(),
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match &self.kind {
            DeviceKind::Sensor(s) => s.unit(),
            DeviceKind::ExposeSensor(e) => e.unit(),
        }
    }
}

/// Read each value's state in order, one at a time. A failed read is logged and
/// the remaining values are still read; returns whether any value changed.
async fn read_states(
    device: &str,
    values: Vec<&mut dyn RemoteValue>,
    wait_for_result: bool,
) -> bool {
    let mut changed = false;
    for value in values {
        match value.read_state(wait_for_result).await {
            Ok(c) => changed |= c,
            Err(e) => tracing::warn!(device, "state read failed: {e}"),
        }
    }
    changed
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind.type_name() == other.kind.type_name()
            && self.group_addresses() == other.group_addresses()
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("kind", &self.kind.type_name())
            .field("group_addresses", &self.group_addresses())
            .field("value", &self.value())
            .field("callbacks", &self.callbacks.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
