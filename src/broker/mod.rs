//! Work Broker Module
//!
//! Decouples the HTTP-facing protocol handler from the corpus workers through
//! a shared job queue, a notify bus and one-shot reply channels.
//!
//! ## Architecture Overview
//! The broker follows a **publish/correlate** model on top of three transport
//! primitives (a durable FIFO list, per-channel pub/sub and a TTL key-value
//! store, see [`bus::MessageBus`]):
//! 1. **Publish**: The handler submits a [`types::Job`]. The adapter attaches a
//!    unique reply channel, subscribes to it *before* enqueueing (no lost
//!    wakeups), pushes the encoded job onto the shared queue and pings idle
//!    workers over the query-notify channel.
//! 2. **Correlate**: A detached watcher task waits on the reply subscription.
//!    The first notification names the key holding the stored result; the
//!    watcher fetches it, decodes it and resolves the caller's wait handle.
//!    The whole publish-to-result window is bounded by the answer deadline.
//! 3. **Consume/Deliver**: Workers drain the queue with `dequeue`, sleep on
//!    the notify subscription between polls, and hand results back with
//!    `publish_result`, which stores the payload under the reply key (with a
//!    TTL) and then notifies the channel.
//!
//! ## Submodules
//! - **`types`**: Job and result records plus the binary wire codec.
//! - **`bus`**: The three-primitive transport contract.
//! - **`memory`**: In-process bus implementation backing the gateway and tests.
//! - **`adapter`**: Publish, consume and deliver contracts with deadlines and
//!   cancellation.

pub mod adapter;
pub mod bus;
pub mod memory;
pub mod types;

pub use adapter::{Adapter, JobHandle};
pub use bus::MessageBus;
pub use memory::MemoryBus;
pub use types::{ConcArgs, ConcResult, Job, Line, LineToken, TransmittedError};

use thiserror::Error;

/// Failures of broker operations themselves. Worker-side failures travel
/// inside [`types::ConcResult`] instead.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("no jobs in the queue")]
    EmptyQueue,
    #[error("failed to encode payload: {0}")]
    Encode(String),
    #[error("failed to decode payload: {0}")]
    Decode(String),
    #[error("bus operation failed: {0}")]
    Bus(String),
    #[error("failed to connect to the message bus at {0}")]
    Connect(String),
}

#[cfg(test)]
mod tests;
