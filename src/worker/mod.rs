//! Worker Module
//!
//! The consume side of the broker contract: a notification-driven loop that
//! drains the shared job queue and answers every job on its reply channel.
//!
//! ## Overview
//! The gateway itself never runs searches; corpus workers do. This module
//! ships the loop those workers run, leaving the actual engine invocation
//! behind the [`ConcordanceEngine`] trait so the native search library stays
//! outside this crate.
//!
//! 1. **Sleep**: between polls the worker waits on the new-job notification
//!    channel, with a periodic fallback tick in case a notification is lost.
//! 2. **Drain**: on wake-up it dequeues until the queue reports empty.
//! 3. **Skip**: jobs whose reply channel has no listener anymore are dropped
//!    without touching the engine; the caller already gave up.
//! 4. **Answer**: engine output and engine failures alike are published to
//!    the reply channel, so a live worker always resolves the caller's wait
//!    handle before its deadline.

use crate::broker::{Adapter, BrokerError, ConcArgs, ConcResult, Job, TransmittedError};
use crate::broker::types::FUNC_CONC_EXAMPLE;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;


const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Interface of the native corpus search engine.
///
/// Implementations live outside this crate; they run one concordance query
/// against one corpus and preserve line order.
#[async_trait]
pub trait ConcordanceEngine: Send + Sync {
    async fn conc_example(&self, args: &ConcArgs) -> anyhow::Result<ConcResult>;
}

/// Job loop bound to one engine instance.
pub struct Worker {
    adapter: Arc<Adapter>,
    engine: Arc<dyn ConcordanceEngine>,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        adapter: Arc<Adapter>,
        engine: Arc<dyn ConcordanceEngine>,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            adapter,
            engine,
            cancel,
        })
    }

    /// Spawn `count` concurrent worker loops.
    pub fn start(self: &Arc<Self>, count: usize) {
        tracing::info!(count, "starting corpus workers");
        for worker_id in 0..count {
            let worker = self.clone();
            tokio::spawn(async move {
                worker.run(worker_id).await;
            });
        }
    }

    /// A single worker loop. Returns when the process is cancelled.
    pub async fn run(&self, worker_id: usize) {
        tracing::info!(worker_id, "worker started");
        let mut notifications = self.adapter.subscribe_queries().await;

        loop {
            self.drain(worker_id).await;

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(worker_id, "worker stopped");
                    return;
                }
                _ = notifications.recv() => {}
                _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
            }
        }
    }

    async fn drain(&self, worker_id: usize) {
        loop {
            match self.adapter.dequeue().await {
                Ok(job) => self.process(worker_id, job).await,
                Err(BrokerError::EmptyQueue) => return,
                Err(e) => {
                    tracing::error!(worker_id, error = %e, "failed to dequeue job");
                    return;
                }
            }
        }
    }

    async fn process(&self, worker_id: usize, job: Job) {
        if !self.adapter.someone_listens(&job.channel).await {
            tracing::debug!(
                worker_id,
                channel = %job.channel,
                "skipping job, nobody waits for the answer"
            );
            return;
        }

        tracing::debug!(worker_id, channel = %job.channel, func = %job.func, "claimed job");
        let result = match job.func.as_str() {
            FUNC_CONC_EXAMPLE => match self.engine.conc_example(&job.args).await {
                Ok(result) => result,
                Err(e) => ConcResult::from_error(TransmittedError::from_anyhow(&e)),
            },
            other => ConcResult::from_error(TransmittedError::new(
                format!("unknown job function: {}", other),
                "UnknownFunction",
            )),
        };

        if let Err(e) = self.adapter.publish_result(&job.channel, &result).await {
            tracing::error!(
                worker_id,
                channel = %job.channel,
                error = %e,
                "failed to publish result"
            );
        }
    }
}
