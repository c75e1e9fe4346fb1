use crate::{GroupAddress, GroupBus, Payload, Result, Telegram, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// A simple in-process mock bus. Each bus instance is independent.
///
/// Sent telegrams are recorded. A GroupValueRead to an address with a stored
/// responder value is answered with a GroupValueResponse on the inbound channel,
/// the way a device on a real line would. A send failure can be armed to make
/// every send return [`TransportError::Io`].
pub struct MockBus {
    sent: Mutex<Vec<Telegram>>,
    send_failure: Mutex<Option<String>>,
    responders: Mutex<HashMap<GroupAddress, Vec<u8>>>,
    inbound: broadcast::Sender<Telegram>,
}

impl MockBus {
    pub fn new() -> Self {
        let (inbound, _) = broadcast::channel(64);
        Self {
            sent: Mutex::new(Vec::new()),
            send_failure: Mutex::new(None),
            responders: Mutex::new(HashMap::new()),
            inbound,
        }
    }

    /// Answer future reads of `address` with `data`.
    pub fn set_responder(&self, address: GroupAddress, data: Vec<u8>) {
        self.responders.lock().insert(address, data);
    }

    /// Fail every following send with an I/O error; `None` restores the bus.
    pub fn set_send_failure(&self, reason: Option<&str>) {
        *self.send_failure.lock() = reason.map(str::to_string);
    }

    /// Deliver a telegram to every subscriber as if it came from the bus.
    pub fn inject(&self, telegram: Telegram) {
        // no subscribers is not an error for a bus
        let _ = self.inbound.send(telegram.stamped());
    }

    pub fn sent(&self) -> Vec<Telegram> {
        self.sent.lock().clone()
    }

    pub fn take_sent(&self) -> Vec<Telegram> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupBus for MockBus {
    async fn send(&self, telegram: Telegram) -> Result<()> {
        if let Some(reason) = self.send_failure.lock().clone() {
            return Err(TransportError::Io(reason));
        }
        let answer = match telegram.payload {
            Payload::GroupValueRead => self.responders.lock().get(&telegram.destination).cloned(),
            _ => None,
        };
        let destination = telegram.destination;
        self.sent.lock().push(telegram);
        if let Some(data) = answer {
            tracing::debug!(%destination, "mock bus answering group read");
            let _ = self
                .inbound
                .send(Telegram::response(destination, data).stamped());
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Telegram> {
        self.inbound.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_records_sent_telegrams() {
        let bus = MockBus::new();
        bus.send(Telegram::write(ga("1/1/1"), vec![0x01])).await.unwrap();
        bus.send(Telegram::read(ga("1/1/2"))).await.unwrap();

        let sent = bus.take_sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].payload, Payload::GroupValueWrite(vec![0x01]));
        assert_eq!(sent[1].destination, ga("1/1/2"));
        assert!(bus.sent().is_empty());
    }

    #[tokio::test]
    async fn test_responder_answers_read() {
        let bus = MockBus::new();
        bus.set_responder(ga("1/2/3"), vec![0x0C, 0x1A]);
        let mut rx = bus.subscribe();

        bus.send(Telegram::read(ga("1/2/3"))).await.unwrap();

        let answer = rx.recv().await.unwrap();
        assert_eq!(answer.destination, ga("1/2/3"));
        assert_eq!(answer.payload, Payload::GroupValueResponse(vec![0x0C, 0x1A]));
        assert!(answer.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_unanswered_read_is_silent() {
        let bus = MockBus::new();
        let mut rx = bus.subscribe();
        bus.send(Telegram::read(ga("1/2/4"))).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_failure_surfaces_io_error() {
        let bus = MockBus::new();
        bus.set_send_failure(Some("line down"));
        let err = bus.send(Telegram::read(ga("1/2/5"))).await.unwrap_err();
        assert!(matches!(err, TransportError::Io(ref reason) if reason == "line down"));
        assert!(bus.sent().is_empty());

        bus.set_send_failure(None);
        bus.send(Telegram::read(ga("1/2/5"))).await.unwrap();
        assert_eq!(bus.sent().len(), 1);
    }
}
