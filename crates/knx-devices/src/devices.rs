use crate::metrics::DeviceMetrics;
use crate::{Device, DeviceError, Result};
use knx_telegram::Telegram;
use tokio::sync::broadcast::{self, error::RecvError};

/// The configured devices, routing inbound telegrams by destination address.
#[derive(Default)]
pub struct Devices {
    devices: Vec<Device>,
    metrics: Option<DeviceMetrics>,
}

impl Devices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: DeviceMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Take ownership of `device`, start its tasks and register its state updaters.
    pub fn add(&mut self, mut device: Device) -> Result<()> {
        if self.get(device.name()).is_some() {
            return Err(DeviceError::Config(format!(
                "duplicate device name {:?}",
                device.name()
            )));
        }
        if let Some(m) = &self.metrics {
            device.attach_failure_counter(m.callback_failures.clone());
        }
        device.start_tasks()?;
        device.register_state_updater();
        tracing::debug!(
            device = device.name(),
            kind = device.kind().type_name(),
            "device added"
        );
        self.devices.push(device);
        self.update_gauge();
        Ok(())
    }

    /// Remove a device, stopping its tasks before handing it back.
    pub async fn remove(&mut self, name: &str) -> Option<Device> {
        let idx = self.devices.iter().position(|d| d.name() == name)?;
        let mut device = self.devices.remove(idx);
        device.unregister_state_updater();
        device.remove_tasks().await;
        self.update_gauge();
        Some(device)
    }

    /// Deliver a telegram to every device listening on its destination, in
    /// insertion order. Returns the number of devices it was routed to.
    pub async fn process(&mut self, telegram: &Telegram) -> usize {
        let mut routed = 0;
        for device in self
            .devices
            .iter_mut()
            .filter(|d| d.has_group_address(telegram.destination))
        {
            routed += 1;
            if let Err(e) = device.process(telegram).await {
                tracing::warn!(
                    device = device.name(),
                    destination = %telegram.destination,
                    "telegram handling failed: {e}"
                );
            }
        }
        if routed > 0 {
            if let Some(m) = &self.metrics {
                m.telegrams_processed.inc();
            }
        } else {
            tracing::trace!(destination = %telegram.destination, "no device for telegram");
        }
        routed
    }

    pub async fn sync_all(&mut self, wait_for_result: bool) {
        for device in &mut self.devices {
            device.sync(wait_for_result).await;
        }
    }

    /// Route telegrams from the bus until the channel closes.
    pub async fn run(&mut self, mut rx: broadcast::Receiver<Telegram>) {
        loop {
            match rx.recv().await {
                Ok(telegram) => {
                    self.process(&telegram).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "device router lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("bus closed, device router stopped");
    }

    /// Drop every device without waiting: state updaters are unregistered and
    /// background tasks aborted.
    pub fn clear(&mut self) {
        for device in &self.devices {
            device.unregister_state_updater();
        }
        self.devices.clear();
        self.update_gauge();
    }

    /// Stop the background tasks of every device.
    pub async fn shutdown(&mut self) {
        for device in &mut self.devices {
            device.remove_tasks().await;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn update_gauge(&self) {
        if let Some(m) = &self.metrics {
            m.devices_loaded.set(self.devices.len() as i64);
        }
    }
}

impl std::fmt::Debug for Devices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Devices")
            .field("devices", &self.devices)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsHub;
    use crate::remote_value::GroupValue;
    use crate::sensor::{ExposeSensor, Sensor};
    use knx_dpt::DptValue;
    use knx_telegram::{GroupAddress, MockBus};
    use std::sync::Arc;

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    fn sensor(name: &str, bus: &Arc<MockBus>, value_type: &str, state: &str) -> Device {
        let tc = knx_dpt::resolve_by_value_type(value_type).unwrap();
        Device::new(
            name,
            Sensor::new(GroupValue::new(tc, bus.clone()).with_state_address(ga(state))),
        )
    }

    #[tokio::test]
    async fn test_routes_by_destination() {
        let bus = Arc::new(MockBus::new());
        let hub = MetricsHub::new().unwrap();
        let mut devices = Devices::new().with_metrics(hub.dev.clone());
        devices.add(sensor("a", &bus, "temperature", "1/0/1")).unwrap();
        devices.add(sensor("b", &bus, "temperature", "1/0/1")).unwrap();
        devices.add(sensor("c", &bus, "percent", "1/0/2")).unwrap();
        assert_eq!(hub.dev.devices_loaded.get(), 3);

        let routed = devices
            .process(&Telegram::write(ga("1/0/1"), vec![0x0C, 0x1A]))
            .await;
        assert_eq!(routed, 2);
        assert_eq!(devices.get("a").unwrap().value(), Some(&DptValue::F64(21.0)));
        assert_eq!(devices.get("b").unwrap().value(), Some(&DptValue::F64(21.0)));
        assert_eq!(devices.get("c").unwrap().value(), None);

        assert_eq!(devices.process(&Telegram::write(ga("7/7/7"), vec![1])).await, 0);
        assert_eq!(hub.dev.telegrams_processed.get(), 1);
    }

    #[tokio::test]
    async fn test_handler_error_does_not_stop_routing() {
        let bus = Arc::new(MockBus::new());
        let mut devices = Devices::new();
        devices.add(sensor("short", &bus, "temperature", "1/0/1")).unwrap();
        devices.add(sensor("byte", &bus, "percent", "1/0/1")).unwrap();

        // one byte: invalid for the 2-byte float, valid for percent
        let routed = devices.process(&Telegram::write(ga("1/0/1"), vec![0xFF])).await;
        assert_eq!(routed, 2);
        assert_eq!(devices.get("short").unwrap().value(), None);
        assert_eq!(devices.get("byte").unwrap().value(), Some(&DptValue::F64(100.0)));
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let bus = Arc::new(MockBus::new());
        let mut devices = Devices::new();
        devices.add(sensor("a", &bus, "temperature", "1/0/1")).unwrap();
        let err = devices
            .add(sensor("a", &bus, "temperature", "1/0/2"))
            .unwrap_err();
        assert!(matches!(err, DeviceError::Config(_)));
        assert_eq!(devices.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let bus = Arc::new(MockBus::new());
        let mut devices = Devices::new();
        devices.add(sensor("a", &bus, "temperature", "1/0/1")).unwrap();
        let removed = devices.remove("a").await.unwrap();
        assert_eq!(removed.name(), "a");
        assert!(devices.is_empty());
        assert!(devices.remove("a").await.is_none());
    }

    #[tokio::test]
    async fn test_run_until_bus_closes() {
        let bus = Arc::new(MockBus::new());
        let mut devices = Devices::new();
        let tc = knx_dpt::resolve_by_value_type("temperature").unwrap();
        devices
            .add(Device::new(
                "exposed",
                ExposeSensor::new(GroupValue::new(tc, bus.clone()).with_group_address(ga("2/0/1"))),
            ))
            .unwrap();

        let (tx, rx) = broadcast::channel(8);
        tx.send(Telegram::write(ga("2/0/1"), vec![0x0C, 0x1A])).unwrap();
        tx.send(Telegram::read(ga("2/0/1"))).unwrap();
        drop(tx);
        devices.run(rx).await;

        assert_eq!(
            devices.get("exposed").unwrap().value(),
            Some(&DptValue::F64(21.0))
        );
        assert_eq!(bus.sent(), vec![Telegram::response(ga("2/0/1"), vec![0x0C, 0x1A])]);
    }

    #[tokio::test]
    async fn test_sync_all_uses_bus() {
        let bus = Arc::new(MockBus::new());
        bus.set_responder(ga("1/0/1"), vec![0x0C, 0x1A]);
        let mut devices = Devices::new();
        devices.add(sensor("a", &bus, "temperature", "1/0/1")).unwrap();
        devices.add(sensor("b", &bus, "temperature", "1/0/2")).unwrap();
        devices.sync_all(false).await;
        let reads: Vec<_> = bus.sent().into_iter().map(|t| t.destination).collect();
        assert_eq!(reads, vec![ga("1/0/1"), ga("1/0/2")]);
        // no-wait sync does not apply answers
        assert_eq!(devices.get("a").unwrap().value(), None);
    }

    #[tokio::test]
    async fn test_clear_empties_router() {
        let bus = Arc::new(MockBus::new());
        let hub = MetricsHub::new().unwrap();
        let mut devices = Devices::new().with_metrics(hub.dev.clone());
        devices.add(sensor("a", &bus, "temperature", "1/0/1")).unwrap();
        devices.add(sensor("b", &bus, "temperature", "1/0/2")).unwrap();
        assert!(format!("{devices:?}").contains("Devices"));

        devices.clear();
        assert!(devices.is_empty());
        assert_eq!(hub.dev.devices_loaded.get(), 0);
    }
}
