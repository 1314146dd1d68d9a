use super::bus::MessageBus;
use super::types::*;
use super::BrokerError;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Tunables of the broker adapter. Zero or empty fields fall back to the
/// wire-format defaults at construction time.
#[derive(Debug, Clone, Default)]
pub struct AdapterConfig {
    /// Bus address for log and error messages, e.g. `localhost:6379`.
    pub server_info: String,
    pub queue_key: String,
    pub channel_result_prefix: String,
    pub channel_query: String,
    pub query_answer_timeout: Duration,
    pub result_ttl: Duration,
}

/// Wait handle of one published job.
///
/// Resolves exactly once: with the worker's result, with a timeout-bearing
/// result when the deadline passes, or with a cancellation-bearing result
/// when the process shuts down while the job is in flight.
pub struct JobHandle {
    channel: String,
    rx: oneshot::Receiver<ConcResult>,
}

impl JobHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn recv(self) -> ConcResult {
        match self.rx.await {
            Ok(result) => result,
            // The watcher dropped its sender without resolving: cancelled.
            Err(_) => ConcResult::from_error(TransmittedError::new(
                "request cancelled while waiting for worker response",
                "Cancelled",
            )),
        }
    }
}

/// Provides functions for job producers and consumers over a [`MessageBus`].
/// Leverages the bus's pub/sub primitives to notify about incoming data.
///
/// The adapter is process-wide: construct it once and hand it to the
/// protocol handlers and workers explicitly.
pub struct Adapter {
    bus: Arc<dyn MessageBus>,
    cancel: CancellationToken,
    server_info: String,
    queue_key: String,
    channel_query: String,
    channel_result_prefix: String,
    query_answer_timeout: Duration,
    result_ttl: Duration,
}

impl Adapter {
    pub fn new(bus: Arc<dyn MessageBus>, conf: AdapterConfig, cancel: CancellationToken) -> Self {
        let mut server_info = conf.server_info;
        if server_info.is_empty() {
            server_info = "in-process".to_string();
        }
        let mut queue_key = conf.queue_key;
        if queue_key.is_empty() {
            queue_key = DEFAULT_QUEUE_KEY.to_string();
        }
        let mut channel_result_prefix = conf.channel_result_prefix;
        if channel_result_prefix.is_empty() {
            channel_result_prefix = DEFAULT_RESULT_CHANNEL_PREFIX.to_string();
            tracing::warn!(
                channel = %channel_result_prefix,
                "result channel prefix not specified, using default"
            );
        }
        let mut channel_query = conf.channel_query;
        if channel_query.is_empty() {
            channel_query = DEFAULT_QUERY_CHANNEL.to_string();
            tracing::warn!(
                channel = %channel_query,
                "query channel not specified, using default"
            );
        }
        let mut query_answer_timeout = conf.query_answer_timeout;
        if query_answer_timeout.is_zero() {
            query_answer_timeout = DEFAULT_QUERY_ANSWER_TIMEOUT;
            tracing::warn!(
                value = query_answer_timeout.as_secs(),
                "query answer timeout not specified, using default"
            );
        }
        let mut result_ttl = conf.result_ttl;
        if result_ttl.is_zero() {
            result_ttl = DEFAULT_RESULT_TTL;
        }

        Self {
            bus,
            cancel,
            server_info,
            queue_key,
            channel_query,
            channel_result_prefix,
            query_answer_timeout,
            result_ttl,
        }
    }

    pub fn query_answer_timeout(&self) -> Duration {
        self.query_answer_timeout
    }

    /// Fresh reply channel name, `<prefix>:<uuid4>`. Never reused, which is
    /// what makes stale results after a timeout harmless.
    pub fn new_reply_channel(&self) -> String {
        format!("{}:{}", self.channel_result_prefix, Uuid::new_v4())
    }

    /// Publish a new job and return the handle its result will arrive on.
    ///
    /// An `Err` here means publishing itself failed and no result will ever
    /// arrive. Once `Ok`, the handle always resolves: the reply subscription
    /// is registered before the job is enqueued, so a worker answering
    /// immediately cannot slip between the two, and the deadline covers the
    /// entire window from before the subscription to the decoded result.
    pub async fn publish_job(&self, mut job: Job) -> Result<JobHandle, BrokerError> {
        let deadline = Instant::now() + self.query_answer_timeout;
        job.channel = self.new_reply_channel();
        tracing::debug!(
            channel = %job.channel,
            func = %job.func,
            query = %job.args.query,
            "publishing job"
        );

        // Every publish-side suspension is bounded by the same deadline the
        // watcher runs under.
        let mut subscription = tokio::time::timeout_at(deadline, self.bus.subscribe(&job.channel))
            .await
            .map_err(|_| BrokerError::Bus("subscribe on reply channel timed out".to_string()))?;
        let payload = job.encode()?;
        tokio::time::timeout_at(deadline, self.bus.push_queue(&self.queue_key, payload))
            .await
            .map_err(|_| BrokerError::Bus("queue push timed out".to_string()))??;
        tokio::time::timeout_at(
            deadline,
            self.bus.publish(&self.channel_query, MSG_NEW_QUERY.to_string()),
        )
        .await
        .map_err(|_| BrokerError::Bus("query notification timed out".to_string()))??;

        let (tx, rx) = oneshot::channel();
        let bus = self.bus.clone();
        let cancel = self.cancel.clone();
        let channel = job.channel.clone();
        let task_channel = channel.clone();

        tokio::spawn(async move {
            let channel = task_channel;
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::warn!(%channel, "job wait interrupted due to cancellation");
                    return;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    ConcResult::from_error(TransmittedError::new(
                        "waiting for worker response timeout",
                        "Timeout",
                    ))
                }
                notification = subscription.recv() => match notification {
                    Ok(result_key) => {
                        tracing::debug!(%channel, key = %result_key, "received result notification");
                        fetch_result(bus.as_ref(), &result_key).await
                    }
                    Err(e) => ConcResult::from_error(TransmittedError::new(
                        format!("reply subscription closed: {}", e),
                        "SubscriptionClosed",
                    )),
                },
            };
            // The receiver being gone just means the caller stopped waiting.
            let _ = tx.send(result);
        });

        Ok(JobHandle { channel, rx })
    }

    /// Pop one queued job. Returns [`BrokerError::EmptyQueue`] when there is
    /// nothing to do, so workers can go back to sleeping on the notify bus.
    pub async fn dequeue(&self) -> Result<Job, BrokerError> {
        match self.bus.pop_queue(&self.queue_key).await? {
            Some(payload) => Job::decode(&payload),
            None => Err(BrokerError::EmptyQueue),
        }
    }

    /// Subscribe to the new-job notification bus.
    pub async fn subscribe_queries(&self) -> tokio::sync::broadcast::Receiver<String> {
        self.bus.subscribe(&self.channel_query).await
    }

    /// Store a result under the job's reply key, then notify the channel with
    /// the key name as payload so the watcher knows what to fetch.
    pub async fn publish_result(
        &self,
        channel: &str,
        result: &ConcResult,
    ) -> Result<(), BrokerError> {
        tracing::debug!(channel, result_type = "concordance", "publishing result");
        let payload = result.encode()?;
        self.bus
            .set_with_ttl(channel, payload, self.result_ttl)
            .await?;
        self.bus.publish(channel, channel.to_string()).await
    }

    /// Whether anybody still waits on the reply channel. Workers use this to
    /// skip jobs whose caller is already gone.
    pub async fn someone_listens(&self, channel: &str) -> bool {
        self.bus.listener_count(channel).await > 0
    }

    /// Probe the bus on a fixed 2 s tick until it answers or `total_timeout`
    /// elapses.
    pub async fn test_connection(
        &self,
        total_timeout: Duration,
        timeout_per_try: Duration,
    ) -> Result<(), BrokerError> {
        let deadline = Instant::now() + total_timeout;
        let mut tick = tokio::time::interval(Duration::from_secs(2));
        tick.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(BrokerError::Connect("cancelled".to_string()));
                }
                _ = tick.tick() => {
                    if Instant::now() >= deadline {
                        return Err(BrokerError::Connect(self.server_info.clone()));
                    }
                    tracing::info!(server = %self.server_info, "waiting for message bus...");
                    match tokio::time::timeout(timeout_per_try, self.bus.ping()).await {
                        Ok(Ok(())) => return Ok(()),
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, "...failed to get response from message bus");
                        }
                        Err(_) => {
                            tracing::error!("...message bus ping timed out");
                        }
                    }
                }
            }
        }
    }
}

async fn fetch_result(bus: &dyn MessageBus, key: &str) -> ConcResult {
    match bus.get(key).await {
        Ok(Some(payload)) => match ConcResult::decode(&payload) {
            Ok(result) => {
                tracing::debug!(
                    key,
                    conc_size = result.conc_size,
                    query = %result.query,
                    "decoded result"
                );
                result
            }
            Err(e) => ConcResult::from_error(TransmittedError::new(
                format!("failed to decode stored result: {}", e),
                "Decode",
            )),
        },
        Ok(None) => ConcResult::from_error(TransmittedError::new(
            "stored result expired or missing",
            "Missing",
        )),
        Err(e) => ConcResult::from_error(TransmittedError::new(
            format!("failed to fetch stored result: {}", e),
            "Bus",
        )),
    }
}
