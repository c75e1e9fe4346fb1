use crate::{Result, Telegram};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// A minimal async KNX group communication interface.
#[async_trait]
pub trait GroupBus: Send + Sync {
    /// Queue one telegram for transmission.
    async fn send(&self, telegram: Telegram) -> Result<()>;

    /// Subscribe to every telegram received from the bus from now on.
    fn subscribe(&self) -> broadcast::Receiver<Telegram>;
}
