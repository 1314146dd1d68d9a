use super::BrokerError;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

/// The three transport primitives the broker is built on: a durable FIFO
/// list, per-channel publish/subscribe notifications and a key-value store
/// with expiry.
///
/// The broker never assumes message ordering across different channels; it
/// relies solely on reply-channel names being unique for correlation. Any
/// backend providing these primitives (an in-process bus, a Redis-style
/// server) can carry the gateway.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Connection probe.
    async fn ping(&self) -> Result<(), BrokerError>;

    /// Append a payload at the head of the named FIFO list.
    async fn push_queue(&self, key: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Pop the oldest payload off the named FIFO list, if any.
    async fn pop_queue(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError>;

    /// Publish a notification to every current subscriber of the channel.
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError>;

    /// Subscribe to a channel. Only notifications published after the call
    /// are delivered, which is why publishers of replies store the result
    /// before notifying and subscribers register before enqueueing work.
    async fn subscribe(&self, channel: &str) -> broadcast::Receiver<String>;

    /// Number of currently registered subscribers of the channel.
    async fn listener_count(&self, channel: &str) -> usize;

    /// Store a value under a key; the value disappears after `ttl`.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), BrokerError>;

    /// Fetch a stored value, honoring expiry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError>;
}
