//! End-to-end scenario mixing priorities, groups and failure paths

#[cfg(test)]
mod tests {
    use crate::queue::api::{
        DeadLetterReason, Message, MessagePriority, QueueConfig, QueueManager,
    };
    use crate::queue::tests::support::{wait_for, ScriptedConsumer};
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn mixed_traffic_flows_to_the_right_consumers() {
        let manager = QueueManager::new(QueueConfig {
            batch_timeout_ms: 20,
            backoff_unit_ms: 1,
            max_retries: 2,
            ..QueueConfig::default()
        })
        .unwrap();
        manager.start();

        // Alert handlers take urgent traffic, bulk workers the rest;
        // nothing supports Background.
        let alert_1 = ScriptedConsumer::new(
            "alert-1",
            &[MessagePriority::Critical, MessagePriority::High],
        );
        let alert_2 = ScriptedConsumer::new(
            "alert-2",
            &[MessagePriority::Critical, MessagePriority::High],
        );
        let bulk = ScriptedConsumer::new(
            "bulk-1",
            &[MessagePriority::Normal, MessagePriority::Low],
        );

        manager.create_consumer_group("alert-handlers").unwrap();
        manager.create_consumer_group("bulk-workers").unwrap();
        manager.add_consumer("alert-handlers", alert_1.clone()).unwrap();
        manager.add_consumer("alert-handlers", alert_2.clone()).unwrap();
        manager.add_consumer("bulk-workers", bulk.clone()).unwrap();

        let accepted = manager.produce_batch(vec![
            Message::with_id("pay-1", "payment", MessagePriority::Critical),
            Message::with_id("call-1", "incoming call", MessagePriority::High),
            Message::with_id("chat-1", "hello", MessagePriority::Normal),
            Message::with_id("file-1", "upload", MessagePriority::Low),
            Message::with_id("log-1", "analytics", MessagePriority::Background),
        ]);
        assert_eq!(accepted, 5);

        // Background has no eligible consumer anywhere and dead-letters;
        // everything else is consumed.
        assert!(wait_for(Duration::from_secs(3), || {
            manager.total_consumed() == 4 && manager.dead_letter_size() == 1
        })
        .await);

        let entry = manager.poll_dead_letter().unwrap();
        assert_eq!(entry.message.id, "log-1");
        assert_eq!(entry.reason, DeadLetterReason::NoEligibleConsumer);

        // Urgent traffic stayed inside the alert group
        let alert_ids: Vec<String> = alert_1
            .processed_ids()
            .into_iter()
            .chain(alert_2.processed_ids())
            .collect();
        assert_eq!(alert_ids.len(), 2);
        assert!(alert_ids.contains(&"pay-1".to_string()));
        assert!(alert_ids.contains(&"call-1".to_string()));
        assert_eq!(bulk.processed_ids().len(), 2);

        let stats = manager.stats();
        assert_eq!(stats.total_produced, 5);
        assert_eq!(stats.total_consumed, 4);

        let by_priority: HashMap<_, _> = stats.produced_by_priority.into_iter().collect();
        assert_eq!(by_priority[&MessagePriority::Critical], 1);
        assert_eq!(by_priority[&MessagePriority::Background], 1);

        let dispatched: u64 = stats
            .consumer_dispatch_counts
            .iter()
            .map(|(_, count)| count)
            .sum();
        assert_eq!(dispatched, 4);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_messages_recover_while_healthy_traffic_continues() {
        let manager = QueueManager::new(QueueConfig {
            batch_timeout_ms: 20,
            backoff_unit_ms: 1,
            max_retries: 3,
            ..QueueConfig::default()
        })
        .unwrap();
        manager.start();

        let flaky = ScriptedConsumer::failing_first("flaky", &[MessagePriority::Normal], 1);
        let steady = ScriptedConsumer::new("steady", &[MessagePriority::High]);
        manager.create_consumer_group("workers").unwrap();
        manager.add_consumer("workers", flaky.clone()).unwrap();
        manager.add_consumer("workers", steady.clone()).unwrap();

        manager
            .produce(Message::with_id("n1", "data", MessagePriority::Normal))
            .unwrap();
        manager
            .produce(Message::with_id("h1", "data", MessagePriority::High))
            .unwrap();

        assert!(wait_for(Duration::from_secs(3), || manager.total_consumed() == 2).await);

        assert_eq!(steady.processed_ids(), vec!["h1".to_string()]);
        let recovered = flaky.processed();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].id, "n1");
        assert_eq!(recovered[0].retry_count, 1);
        assert_eq!(manager.dead_letter_size(), 0);

        manager.shutdown().await.unwrap();
    }
}
