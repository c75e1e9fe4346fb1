use crate::{DeviceError, Result};
use async_trait::async_trait;
use knx_dpt::{DptValue, Transcoder};
use knx_telegram::{GroupAddress, GroupBus, Telegram, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// One device attribute bound to bus addresses.
#[async_trait]
pub trait RemoteValue: Send + Sync {
    /// Request the current value from the bus. When `wait_for_result` is set the
    /// answer is awaited and applied; returns whether the stored value changed.
    async fn read_state(&mut self, wait_for_result: bool) -> Result<bool>;

    /// Apply an inbound telegram; `Ok(true)` when the stored value changed.
    fn process(&mut self, telegram: &Telegram) -> Result<bool>;

    fn group_addresses(&self) -> Vec<GroupAddress>;

    fn has_group_address(&self, address: GroupAddress) -> bool {
        self.group_addresses().contains(&address)
    }

    fn register_state_updater(&self);

    fn unregister_state_updater(&self);
}

/// Periodic state refresh, owned outside this crate.
pub trait StateUpdater: Send + Sync {
    fn register(&self, address: GroupAddress, value_type: &'static str);
    fn unregister(&self, address: GroupAddress);
}

/// A [`RemoteValue`] decoding through one transcoder.
pub struct GroupValue {
    transcoder: &'static Transcoder,
    group_address: Option<GroupAddress>,
    group_address_state: Option<GroupAddress>,
    passive_addresses: Vec<GroupAddress>,
    sync_state: bool,
    value: Option<DptValue>,
    bus: Arc<dyn GroupBus>,
    state_updater: Option<Arc<dyn StateUpdater>>,
    read_timeout: Duration,
}

impl GroupValue {
    pub fn new(transcoder: &'static Transcoder, bus: Arc<dyn GroupBus>) -> Self {
        Self {
            transcoder,
            group_address: None,
            group_address_state: None,
            passive_addresses: Vec::new(),
            sync_state: true,
            value: None,
            bus,
            state_updater: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Address written to and answered on.
    pub fn with_group_address(mut self, address: GroupAddress) -> Self {
        self.group_address = Some(address);
        self
    }

    /// Address read from during synchronization.
    pub fn with_state_address(mut self, address: GroupAddress) -> Self {
        self.group_address_state = Some(address);
        self
    }

    /// Extra addresses whose writes update the value.
    pub fn with_passive_addresses(mut self, addresses: Vec<GroupAddress>) -> Self {
        self.passive_addresses = addresses;
        self
    }

    pub fn with_sync_state(mut self, sync_state: bool) -> Self {
        self.sync_state = sync_state;
        self
    }

    pub fn with_state_updater(mut self, updater: Arc<dyn StateUpdater>) -> Self {
        self.state_updater = Some(updater);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn value(&self) -> Option<&DptValue> {
        self.value.as_ref()
    }

    pub fn transcoder(&self) -> &'static Transcoder {
        self.transcoder
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.transcoder.unit
    }

    pub fn group_address(&self) -> Option<GroupAddress> {
        self.group_address
    }

    pub fn state_address(&self) -> Option<GroupAddress> {
        self.group_address_state
    }

    pub(crate) fn bus(&self) -> Arc<dyn GroupBus> {
        Arc::clone(&self.bus)
    }

    /// Encode `value` and write it to the group address. The stored value is the
    /// one the bus carries, after quantization; returns whether it changed.
    pub async fn set(&mut self, value: DptValue) -> Result<bool> {
        let data = self.transcoder.encode(&value)?;
        let value = self.transcoder.decode(&data)?;
        if let Some(address) = self.group_address {
            self.bus.send(Telegram::write(address, data)).await?;
        }
        let changed = self.value.as_ref() != Some(&value);
        self.value = Some(value);
        Ok(changed)
    }

    /// Answer a group read with the current value, if there is one.
    pub async fn respond(&self) -> Result<()> {
        let (Some(address), Some(value)) = (self.group_address, self.value.as_ref()) else {
            return Ok(());
        };
        let data = self.transcoder.encode(value)?;
        self.bus.send(Telegram::response(address, data)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteValue for GroupValue {
    async fn read_state(&mut self, wait_for_result: bool) -> Result<bool> {
        let Some(address) = self.group_address_state else {
            return Ok(false);
        };
        if !wait_for_result {
            self.bus.send(Telegram::read(address)).await?;
            return Ok(false);
        }
        // subscribe before sending so a fast answer is not missed
        let mut rx = self.bus.subscribe();
        self.bus.send(Telegram::read(address)).await?;
        let telegram = tokio::time::timeout(self.read_timeout, next_value(&mut rx, address))
            .await
            .map_err(|_| DeviceError::ReadTimeout(address))??;
        self.process(&telegram)
    }

    fn process(&mut self, telegram: &Telegram) -> Result<bool> {
        if !self.has_group_address(telegram.destination) {
            return Ok(false);
        }
        let Some(data) = telegram.payload.data() else {
            return Ok(false);
        };
        let value = self.transcoder.decode(data)?;
        let changed = self.value.as_ref() != Some(&value);
        self.value = Some(value);
        Ok(changed)
    }

    fn group_addresses(&self) -> Vec<GroupAddress> {
        self.group_address
            .iter()
            .chain(self.group_address_state.iter())
            .chain(self.passive_addresses.iter())
            .copied()
            .collect()
    }

    fn register_state_updater(&self) {
        if let (true, Some(address), Some(updater)) =
            (self.sync_state, self.group_address_state, &self.state_updater)
        {
            updater.register(address, self.transcoder.value_type);
        }
    }

    fn unregister_state_updater(&self) {
        if let (Some(address), Some(updater)) = (self.group_address_state, &self.state_updater) {
            updater.unregister(address);
        }
    }
}

async fn next_value(
    rx: &mut broadcast::Receiver<Telegram>,
    address: GroupAddress,
) -> Result<Telegram> {
    loop {
        match rx.recv().await {
            Ok(telegram)
                if telegram.destination == address && telegram.payload.data().is_some() =>
            {
                return Ok(telegram)
            }
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(%address, skipped, "telegram subscriber lagged while waiting");
            }
            Err(RecvError::Closed) => return Err(TransportError::Closed.into()),
        }
    }
}
