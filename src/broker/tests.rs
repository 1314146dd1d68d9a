#[cfg(test)]
mod tests {
    use crate::broker::adapter::{Adapter, AdapterConfig};
    use crate::broker::bus::MessageBus;
    use crate::broker::memory::MemoryBus;
    use crate::broker::types::*;
    use crate::broker::BrokerError;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn sample_job(query: &str) -> Job {
        Job {
            channel: String::new(),
            func: FUNC_CONC_EXAMPLE.to_string(),
            args: ConcArgs {
                corpus_path: "/registry/syn2020".to_string(),
                query: query.to_string(),
                attrs: vec!["word".to_string(), "lemma".to_string()],
                max_items: 10,
                start_line: 0,
                max_context: 40,
                view_context_struct: "s".to_string(),
            },
        }
    }

    fn sample_result(query: &str, words: &[(&str, bool)]) -> ConcResult {
        ConcResult {
            conc_size: words.len(),
            query: query.to_string(),
            lines: vec![Line {
                text: words
                    .iter()
                    .map(|(word, strong)| LineToken {
                        word: word.to_string(),
                        strong: *strong,
                    })
                    .collect(),
            }],
            error: None,
        }
    }

    fn test_adapter(bus: Arc<MemoryBus>, timeout: Duration) -> Arc<Adapter> {
        Arc::new(Adapter::new(
            bus,
            AdapterConfig {
                query_answer_timeout: timeout,
                ..Default::default()
            },
            CancellationToken::new(),
        ))
    }

    /// Answers every queued job with an echo of its query string.
    fn spawn_echo_worker(adapter: Arc<Adapter>) {
        tokio::spawn(async move {
            loop {
                match adapter.dequeue().await {
                    Ok(job) => {
                        let result =
                            sample_result(&job.args.query, &[("left", false), ("hit", true)]);
                        adapter
                            .publish_result(&job.channel, &result)
                            .await
                            .expect("publish_result failed");
                    }
                    Err(BrokerError::EmptyQueue) => {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                    Err(_) => return,
                }
            }
        });
    }

    // ============================================================
    // Wire format round-trips
    // ============================================================

    #[test]
    fn test_job_round_trip() {
        let job = Job {
            channel: "mqueryResults:abc".to_string(),
            ..sample_job("[word=\"dog\"]")
        };
        let decoded = Job::decode(&job.encode().unwrap()).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_conc_result_round_trip() {
        let result = sample_result("[word=\"dog\"]", &[("a", false), ("dog", true), ("b", false)]);
        let decoded = ConcResult::decode(&result.encode().unwrap()).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_conc_result_round_trip_with_error() {
        let result = ConcResult::from_error(TransmittedError::new(
            ERR_ROWS_RANGE_OUT_OF_CONC,
            "EngineError",
        ));
        let decoded = ConcResult::decode(&result.encode().unwrap()).unwrap();
        assert_eq!(decoded, result);
        assert!(decoded.err().unwrap().is_rows_range_out_of_conc());
    }

    #[test]
    fn test_job_decode_rejects_garbage() {
        assert!(matches!(
            Job::decode(b"definitely not msgpack"),
            Err(BrokerError::Decode(_))
        ));
    }

    #[test]
    fn test_transmitted_error_from_anyhow_keeps_transmitted() {
        let original = TransmittedError::new("boom", "EngineError");
        let wrapped = anyhow::Error::new(original.clone());
        assert_eq!(TransmittedError::from_anyhow(&wrapped), original);

        let plain = anyhow::anyhow!("plain failure");
        let flattened = TransmittedError::from_anyhow(&plain);
        assert_eq!(flattened.message, "plain failure");
    }

    // ============================================================
    // Memory bus primitives
    // ============================================================

    #[tokio::test]
    async fn test_memory_bus_queue_is_fifo() {
        let bus = MemoryBus::new();
        bus.push_queue("q", b"first".to_vec()).await.unwrap();
        bus.push_queue("q", b"second".to_vec()).await.unwrap();
        bus.push_queue("q", b"third".to_vec()).await.unwrap();

        assert_eq!(bus.pop_queue("q").await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(bus.pop_queue("q").await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(bus.pop_queue("q").await.unwrap(), Some(b"third".to_vec()));
        assert_eq!(bus.pop_queue("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_bus_ttl_expiry() {
        let bus = MemoryBus::new();
        bus.set_with_ttl("key", b"value".to_vec(), Duration::from_millis(40))
            .await
            .unwrap();
        assert_eq!(bus.get("key").await.unwrap(), Some(b"value".to_vec()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(bus.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_bus_pubsub_delivery_and_listener_count() {
        let bus = MemoryBus::new();
        assert_eq!(bus.listener_count("ch").await, 0);

        let mut rx = bus.subscribe("ch").await;
        assert_eq!(bus.listener_count("ch").await, 1);

        bus.publish("ch", "payload".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "payload");

        drop(rx);
        assert_eq!(bus.listener_count("ch").await, 0);

        // Publishing into the void is not a transport failure.
        bus.publish("nobody", "x".to_string()).await.unwrap();
    }

    // ============================================================
    // Publish / correlate
    // ============================================================

    #[tokio::test]
    async fn test_publish_and_correlate_single_job() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_secs(5));
        spawn_echo_worker(adapter.clone());

        let handle = adapter.publish_job(sample_job("[word=\"dog\"]")).await.unwrap();
        let result = handle.recv().await;

        assert!(result.err().is_none());
        assert_eq!(result.query, "[word=\"dog\"]");
        assert_eq!(result.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_correlate_to_their_own_results() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_secs(5));
        spawn_echo_worker(adapter.clone());

        let handle_a = adapter.publish_job(sample_job("[word=\"a\"]")).await.unwrap();
        let handle_b = adapter.publish_job(sample_job("[word=\"b\"]")).await.unwrap();
        assert_ne!(handle_a.channel(), handle_b.channel());

        // Join in reverse publish order to prove correlation is by channel,
        // not by arrival order.
        let result_b = handle_b.recv().await;
        let result_a = handle_a.recv().await;

        assert_eq!(result_a.query, "[word=\"a\"]");
        assert_eq!(result_b.query, "[word=\"b\"]");
    }

    #[tokio::test]
    async fn test_deadline_resolves_handle_with_timeout_error() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_millis(200));

        let started = std::time::Instant::now();
        let handle = adapter.publish_job(sample_job("[word=\"x\"]")).await.unwrap();
        let result = handle.recv().await;
        let elapsed = started.elapsed();

        let error = result.err().expect("timeout must surface as an error");
        assert_eq!(error.type_name, "Timeout");
        // Deadline plus slack, never unbounded.
        assert!(elapsed < Duration::from_millis(1200), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_cancellation_resolves_handle() {
        let bus = Arc::new(MemoryBus::new());
        let cancel = CancellationToken::new();
        let adapter = Arc::new(Adapter::new(
            bus,
            AdapterConfig {
                query_answer_timeout: Duration::from_secs(60),
                ..Default::default()
            },
            cancel.clone(),
        ));

        let handle = adapter.publish_job(sample_job("[word=\"x\"]")).await.unwrap();
        cancel.cancel();

        let result = handle.recv().await;
        assert_eq!(result.err().unwrap().type_name, "Cancelled");
    }

    #[tokio::test]
    async fn test_undecodable_stored_result_is_delivered_as_error() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus.clone(), Duration::from_secs(5));

        let handle = adapter.publish_job(sample_job("[word=\"x\"]")).await.unwrap();
        let channel = handle.channel().to_string();

        // A worker that stores garbage and notifies anyway.
        bus.set_with_ttl(&channel, b"garbage".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        bus.publish(&channel, channel.clone()).await.unwrap();

        let result = handle.recv().await;
        assert_eq!(result.err().unwrap().type_name, "Decode");
    }

    #[tokio::test]
    async fn test_someone_listens_tracks_watcher_lifetime() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_millis(100));

        let handle = adapter.publish_job(sample_job("[word=\"x\"]")).await.unwrap();
        let channel = handle.channel().to_string();
        assert!(adapter.someone_listens(&channel).await);
        assert!(!adapter.someone_listens("mqueryResults:unknown").await);

        // After the deadline fires, the watcher tears its subscription down.
        let _ = handle.recv().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!adapter.someone_listens(&channel).await);
    }

    // ============================================================
    // Consume side
    // ============================================================

    #[tokio::test]
    async fn test_dequeue_empty_queue() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_secs(5));
        assert!(matches!(
            adapter.dequeue().await,
            Err(BrokerError::EmptyQueue)
        ));
    }

    #[tokio::test]
    async fn test_publish_notifies_query_channel() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus.clone(), Duration::from_secs(5));

        let mut queries = adapter.subscribe_queries().await;
        let _handle = adapter.publish_job(sample_job("[word=\"x\"]")).await.unwrap();

        assert_eq!(queries.recv().await.unwrap(), MSG_NEW_QUERY);
        assert_eq!(bus.queue_len(DEFAULT_QUEUE_KEY), 1);
        let job = adapter.dequeue().await.unwrap();
        assert_eq!(job.func, FUNC_CONC_EXAMPLE);
        assert!(job.channel.starts_with(DEFAULT_RESULT_CHANNEL_PREFIX));
        assert_eq!(bus.queue_len(DEFAULT_QUEUE_KEY), 0);
    }

    #[tokio::test]
    async fn test_connection_probe_succeeds_against_memory_bus() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_secs(5));
        adapter
            .test_connection(Duration::from_secs(10), Duration::from_secs(1))
            .await
            .unwrap();
    }

    // ============================================================
    // Reply channel uniqueness
    // ============================================================

    #[tokio::test]
    async fn test_reply_channels_never_collide() {
        let bus = Arc::new(MemoryBus::new());
        let adapter = test_adapter(bus, Duration::from_secs(5));

        let mut seen = HashSet::with_capacity(1_000_000);
        for _ in 0..1_000_000 {
            assert!(seen.insert(adapter.new_reply_channel()));
        }
    }
}
