//! Retry and backoff behaviour: bounded retries, monotone counters,
//! terminal dead-lettering

#[cfg(test)]
mod tests {
    use crate::queue::api::{
        DeadLetterReason, Message, MessagePriority, QueueConfig, QueueManager,
    };
    use crate::queue::tests::support::{wait_for, ScriptedConsumer};
    use std::time::Duration;

    fn retry_config(max_retries: u32) -> QueueConfig {
        QueueConfig {
            max_retries,
            batch_timeout_ms: 20,
            backoff_unit_ms: 1,
            ..QueueConfig::default()
        }
    }

    #[tokio::test]
    async fn message_failing_then_succeeding_keeps_exact_retry_count() {
        let manager = QueueManager::new(retry_config(3)).unwrap();
        manager.start();

        // Fails twice, succeeds on the third attempt
        let consumer = ScriptedConsumer::failing_first("flaky", &[MessagePriority::Normal], 2);
        manager.create_consumer_group("workers").unwrap();
        manager.add_consumer("workers", consumer.clone()).unwrap();

        manager
            .produce(Message::with_id("m1", "data", MessagePriority::Normal))
            .unwrap();

        assert!(wait_for(Duration::from_secs(3), || manager.total_consumed() == 1).await);

        let processed = consumer.processed();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].retry_count, 2);
        assert_eq!(consumer.attempts(), 3);

        // Never dead-lettered
        assert_eq!(manager.dead_letter_size(), 0);
        assert_eq!(manager.stats().total_retries, 2);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn exhausted_retry_budget_dead_letters_exactly_once() {
        let max_retries = 2;
        let manager = QueueManager::new(retry_config(max_retries)).unwrap();
        manager.start();

        let consumer = ScriptedConsumer::always_failing("broken", &[MessagePriority::Normal]);
        manager.create_consumer_group("workers").unwrap();
        manager.add_consumer("workers", consumer.clone()).unwrap();

        manager
            .produce(Message::with_id("doomed", "data", MessagePriority::Normal))
            .unwrap();

        assert!(wait_for(Duration::from_secs(3), || manager.dead_letter_size() == 1).await);

        // Initial attempt plus max_retries re-deliveries
        assert_eq!(consumer.attempts(), max_retries + 1);

        let entry = manager.poll_dead_letter().unwrap();
        assert_eq!(entry.message.id, "doomed");
        assert_eq!(entry.reason, DeadLetterReason::MaxRetriesExceeded);
        assert_eq!(entry.message.retry_count(), max_retries + 1);

        // Settle and confirm nothing is requeued afterwards
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(consumer.attempts(), max_retries + 1);
        assert_eq!(manager.dead_letter_size(), 0); // already polled, nothing new
        assert_eq!(manager.queue_size(), 0);
        assert_eq!(manager.total_consumed(), 0);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn zero_max_retries_dead_letters_on_first_failure() {
        let manager = QueueManager::new(retry_config(0)).unwrap();
        manager.start();

        let consumer = ScriptedConsumer::always_failing("broken", &[MessagePriority::High]);
        manager.create_consumer_group("workers").unwrap();
        manager.add_consumer("workers", consumer.clone()).unwrap();

        manager
            .produce(Message::with_id("m1", "data", MessagePriority::High))
            .unwrap();

        assert!(wait_for(Duration::from_secs(2), || manager.dead_letter_size() == 1).await);
        assert_eq!(consumer.attempts(), 1);
        assert_eq!(manager.stats().total_retries, 0);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn retried_message_keeps_priority_and_identity() {
        let manager = QueueManager::new(retry_config(3)).unwrap();
        manager.start();

        let consumer = ScriptedConsumer::failing_first("flaky", &[MessagePriority::Critical], 1);
        manager.create_consumer_group("workers").unwrap();
        manager.add_consumer("workers", consumer.clone()).unwrap();

        let sequence = manager
            .produce(Message::with_id("m1", "data", MessagePriority::Critical))
            .unwrap();

        assert!(wait_for(Duration::from_secs(3), || manager.total_consumed() == 1).await);
        assert_eq!(consumer.processed_ids(), vec!["m1".to_string()]);
        // Priority counters only reflect the original produce
        assert_eq!(
            manager.stats().produced_by_priority[0],
            (MessagePriority::Critical, 1)
        );
        assert_eq!(sequence, 1);

        manager.shutdown().await.unwrap();
    }
}
