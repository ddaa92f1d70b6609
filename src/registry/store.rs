//! Topic registry implementation
//!
//! The central registry that owns all live topics and routes posted messages
//! to their subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use super::config::RegistryConfig;
use super::topic::{SubscriberId, Topic};
use super::update::Update;

/// A live subscription handle returned by [`TopicRegistry::subscribe`]
///
/// Carries the delivery queue receiver plus the topic handle the connection
/// driver uses for replay, count announcements, and teardown.
pub struct Subscription {
    /// The topic this subscription belongs to
    pub topic: Arc<Topic>,

    /// This subscriber's ID within the topic
    pub id: SubscriberId,

    /// Receiving end of the bounded delivery queue
    pub rx: mpsc::Receiver<Bytes>,
}

/// Central registry for all live topics
///
/// Held as `Arc<TopicRegistry>` by every request-handling context; tests
/// instantiate their own isolated registries. A topic exists exactly as long
/// as it has at least one subscriber: the first subscriber creates it and the
/// last one's departure removes it, so abandoned or typo'd topic names never
/// accumulate.
pub struct TopicRegistry {
    /// Map of topic name to topic
    topics: RwLock<HashMap<String, Arc<Topic>>>,

    config: RegistryConfig,

    next_subscriber_id: AtomicU64,
}

impl TopicRegistry {
    /// Create a registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new subscriber on a topic
    ///
    /// The topic is created on first subscription; concurrent first
    /// subscribers to the same name land in the same topic. Never fails.
    pub async fn subscribe(&self, name: &str) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.buffer_size);

        // The subscriber is inserted while the map lock is held, so the
        // topic cannot be collected between lookup and insert.
        let topic = {
            let mut topics = self.topics.write().await;
            let topic = topics
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Topic::new(name, &self.config)));
            topic.insert_subscriber(id, tx).await;
            Arc::clone(topic)
        };

        let subscribers = topic.subscriber_count().await;
        tracing::info!(
            topic = %name,
            subscriber = id,
            subscribers = subscribers,
            "Subscriber added"
        );

        Subscription { topic, id, rx }
    }

    /// Remove a subscriber from a topic
    ///
    /// A missing topic or an already-removed subscriber is a no-op. The topic
    /// itself is removed once its subscriber set becomes empty.
    pub async fn unsubscribe(&self, name: &str, id: SubscriberId) {
        let mut topics = self.topics.write().await;

        if let Some(topic) = topics.get(name) {
            if topic.remove_subscriber(id).await {
                topics.remove(name);
                tracing::debug!(topic = %name, subscriber = id, "Last subscriber left, topic removed");
            } else {
                tracing::debug!(topic = %name, subscriber = id, "Subscriber removed");
            }
        }
    }

    /// Ingest boundary: broadcast a posted message on a topic
    ///
    /// `text` must arrive already trimmed, HTML-escaped, and length-bounded.
    /// Empty text and topics nobody is watching are both no-ops: no update is
    /// constructed and nothing is mutated.
    pub async fn submit_message(&self, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }

        let topic = {
            let topics = self.topics.read().await;
            topics.get(name).cloned()
        };

        let Some(topic) = topic else {
            tracing::debug!(topic = %name, "Post to unwatched topic ignored");
            return;
        };

        topic.broadcast(Update::new(text)).await;
    }

    /// Number of live topics
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Whether a topic currently exists
    pub async fn topic_exists(&self, name: &str) -> bool {
        self.topics.read().await.contains_key(name)
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::update::count_fragment;

    #[tokio::test]
    async fn test_history_bound() {
        let registry = TopicRegistry::with_config(RegistryConfig::default().history_limit(4));
        let sub = registry.subscribe("room").await;

        for i in 0..10 {
            sub.topic
                .broadcast(Update::at("2024-01-01 00:00:00", format!("m{}", i)))
                .await;
        }

        assert_eq!(sub.topic.history_len().await, 4);

        // Retained entries are the most recent four, in arrival order
        let frames = sub.topic.replay_frames().await;
        let expected: Vec<_> = (6..10)
            .map(|i| Update::at("2024-01-01 00:00:00", format!("m{}", i)).render_replay())
            .collect();
        assert_eq!(frames, expected);
    }

    #[tokio::test]
    async fn test_fanout_byte_identical() {
        let registry = TopicRegistry::new();
        let mut subs = Vec::new();
        for _ in 0..3 {
            subs.push(registry.subscribe("room").await);
        }

        let update = Update::at("2024-01-01 00:00:00", "hello");
        subs[0].topic.broadcast(update.clone()).await;

        for sub in subs.iter_mut() {
            assert_eq!(sub.rx.recv().await.unwrap(), update.render_live());
        }
    }

    #[tokio::test]
    async fn test_drop_on_full() {
        let registry = TopicRegistry::with_config(RegistryConfig::default().buffer_size(1));
        let mut stalled = registry.subscribe("room").await;
        let mut healthy = registry.subscribe("room").await;

        let first = Update::at("2024-01-01 00:00:00", "first");
        let second = Update::at("2024-01-01 00:00:01", "second");

        // First broadcast fills the stalled subscriber's queue; the healthy
        // one keeps draining
        stalled.topic.broadcast(first.clone()).await;
        assert_eq!(healthy.rx.recv().await.unwrap(), first.render_live());

        // Second is dropped for the stalled subscriber, delivered to the other
        stalled.topic.broadcast(second.clone()).await;
        assert_eq!(healthy.rx.recv().await.unwrap(), second.render_live());

        assert_eq!(stalled.rx.recv().await.unwrap(), first.render_live());
        assert!(stalled.rx.try_recv().is_err());

        // Both stay in history regardless of delivery
        assert_eq!(stalled.topic.history_len().await, 2);
    }

    #[tokio::test]
    async fn test_topic_garbage_collection() {
        let registry = TopicRegistry::new();

        let sub = registry.subscribe("room").await;
        sub.topic
            .broadcast(Update::at("2024-01-01 00:00:00", "old"))
            .await;
        assert!(registry.topic_exists("room").await);

        registry.unsubscribe("room", sub.id).await;
        assert!(!registry.topic_exists("room").await);
        assert_eq!(registry.topic_count().await, 0);

        // Re-subscribing creates a fresh topic with empty history
        let fresh = registry.subscribe("room").await;
        assert_eq!(fresh.topic.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_topic_survives_while_subscribed() {
        let registry = TopicRegistry::new();
        let a = registry.subscribe("room").await;
        let b = registry.subscribe("room").await;

        registry.unsubscribe("room", a.id).await;
        assert!(registry.topic_exists("room").await);

        registry.unsubscribe("room", b.id).await;
        assert!(!registry.topic_exists("room").await);
    }

    #[tokio::test]
    async fn test_count_accuracy() {
        let registry = TopicRegistry::new();
        let mut subs = Vec::new();
        for _ in 0..4 {
            subs.push(registry.subscribe("room").await);
        }

        registry.unsubscribe("room", subs[0].id).await;
        let mut remaining = subs.split_off(1);

        remaining[0].topic.announce_count().await;
        assert_eq!(remaining[0].rx.recv().await.unwrap(), count_fragment(3));
    }

    #[tokio::test]
    async fn test_empty_message_noop() {
        let registry = TopicRegistry::new();
        let sub = registry.subscribe("room").await;

        registry.submit_message("room", "").await;

        assert_eq!(sub.topic.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_topic_ingest_noop() {
        let registry = TopicRegistry::new();

        registry.submit_message("nobody-home", "hello").await;

        assert!(!registry.topic_exists("nobody-home").await);
        assert_eq!(registry.topic_count().await, 0);
    }

    #[tokio::test]
    async fn test_submit_message_broadcasts() {
        let registry = TopicRegistry::new();
        let mut sub = registry.subscribe("room").await;

        registry.submit_message("room", "hello").await;

        let payload = sub.rx.recv().await.unwrap();
        assert!(payload.starts_with(b"<div class=\"new\"><p>hello</p>"));
        assert_eq!(sub.topic.history_len().await, 1);
    }

    #[tokio::test]
    async fn test_idempotent_unsubscribe() {
        let registry = TopicRegistry::new();
        let sub = registry.subscribe("room").await;

        // Unknown topic
        registry.unsubscribe("ghost", sub.id).await;
        // Unknown subscriber on a live topic
        registry.unsubscribe("room", 9999).await;

        assert!(registry.topic_exists("room").await);
        assert_eq!(sub.topic.subscriber_count().await, 1);

        // Double-unsubscribe of the same ID
        registry.unsubscribe("room", sub.id).await;
        registry.unsubscribe("room", sub.id).await;
        assert!(!registry.topic_exists("room").await);
    }

    #[tokio::test]
    async fn test_topics_are_independent() {
        let registry = TopicRegistry::new();
        let mut red = registry.subscribe("red").await;
        let mut blue = registry.subscribe("blue").await;

        let update = Update::at("2024-01-01 00:00:00", "for red only");
        red.topic.broadcast(update.clone()).await;

        assert_eq!(red.rx.recv().await.unwrap(), update.render_live());
        assert!(blue.rx.try_recv().is_err());
        assert_eq!(blue.topic.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_replay_ordering() {
        let registry = TopicRegistry::new();
        let keeper = registry.subscribe("room").await;

        for msg in ["a", "b", "c"] {
            keeper
                .topic
                .broadcast(Update::at("2024-01-01 00:00:00", msg))
                .await;
        }

        let late = registry.subscribe("room").await;
        let frames = late.topic.replay_frames().await;

        assert_eq!(
            frames,
            vec![
                Update::at("2024-01-01 00:00:00", "a").render_replay(),
                Update::at("2024-01-01 00:00:00", "b").render_replay(),
                Update::at("2024-01-01 00:00:00", "c").render_replay(),
            ]
        );
    }
}
