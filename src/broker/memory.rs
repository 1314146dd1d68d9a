use super::bus::MessageBus;
use super::BrokerError;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

struct StoredValue {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// In-process implementation of the broker transport.
///
/// Queues are `VecDeque`s pushed at the front and popped at the back, so the
/// oldest job leaves first. Channels are `tokio::sync::broadcast` senders
/// created lazily on first use. Stored values expire lazily: an expired entry
/// is dropped the next time somebody asks for it.
pub struct MemoryBus {
    queues: DashMap<String, Mutex<VecDeque<Vec<u8>>>>,
    channels: DashMap<String, broadcast::Sender<String>>,
    store: DashMap<String, StoredValue>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            channels: DashMap::new(),
            store: DashMap::new(),
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    pub fn queue_len(&self, key: &str) -> usize {
        self.queues.get(key).map(|q| q.lock().len()).unwrap_or(0)
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn ping(&self) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn push_queue(&self, key: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let queue = self
            .queues
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::new()));
        queue.lock().push_front(payload);
        Ok(())
    }

    async fn pop_queue(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError> {
        match self.queues.get(key) {
            Some(queue) => Ok(queue.lock().pop_back()),
            None => Ok(None),
        }
    }

    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        if let Some(sender) = self.channels.get(channel).map(|s| s.clone()) {
            // A send error only means there is no live subscriber, which is
            // not a transport failure for a notification bus.
            let _ = sender.send(payload);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        self.sender(channel).subscribe()
    }

    async fn listener_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), BrokerError> {
        self.store.insert(
            key.to_string(),
            StoredValue {
                payload: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError> {
        if let Some(entry) = self.store.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.payload.clone()));
            }
        } else {
            return Ok(None);
        }
        // Expired: drop the entry outside of the read guard.
        self.store.remove(key);
        Ok(None)
    }
}
