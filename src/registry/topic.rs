//! Per-topic state: subscriber set and bounded history
//!
//! Each topic guards its subscriber set and its history with independent
//! `RwLock`s, so a broadcast's fan-out pass (shared subscriber lock) never
//! waits on a history replay (shared history lock) or the other way around,
//! and work on one topic never blocks another.

use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

use super::config::RegistryConfig;
use super::update::{count_fragment, Update};

/// Identifier for one subscriber connection
pub type SubscriberId = u64;

/// A named broadcast channel with its own subscribers and history
pub struct Topic {
    name: String,

    /// Active subscriber delivery queues, keyed by subscriber ID
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Bytes>>>,

    /// Most recent updates, oldest first
    history: RwLock<VecDeque<Update>>,

    history_limit: usize,
}

impl Topic {
    pub(super) fn new(name: &str, config: &RegistryConfig) -> Self {
        Self {
            name: name.to_string(),
            subscribers: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::with_capacity(config.history_limit)),
            history_limit: config.history_limit,
        }
    }

    /// The topic's name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(super) async fn insert_subscriber(&self, id: SubscriberId, tx: mpsc::Sender<Bytes>) {
        self.subscribers.write().await.insert(id, tx);
    }

    /// Remove a subscriber; returns true if the set is now empty
    ///
    /// Removing an ID that is not registered is a no-op.
    pub(super) async fn remove_subscriber(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        subscribers.remove(&id);
        subscribers.is_empty()
    }

    /// Number of active subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Number of updates currently held in history
    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    /// Append an update to history and deliver it to every subscriber
    ///
    /// Delivery is best-effort: a subscriber whose queue is full misses this
    /// payload and is never caught up. The broadcaster never blocks.
    pub async fn broadcast(&self, update: Update) {
        let payload = update.render_live();

        {
            let mut history = self.history.write().await;
            history.push_back(update);
            while history.len() > self.history_limit {
                history.pop_front();
            }
        }

        self.fan_out(payload).await;
    }

    /// Push the current viewer count to every subscriber
    ///
    /// The count is read under the same shared lock as the fan-out pass, so
    /// it never reports a size the set did not have.
    pub async fn announce_count(&self) {
        let subscribers = self.subscribers.read().await;
        let payload = count_fragment(subscribers.len());

        for (id, tx) in subscribers.iter() {
            self.try_deliver(*id, tx, payload.clone());
        }
    }

    /// Render the stored history, oldest to newest
    ///
    /// The caller writes these to its own sink outside the lock; any write
    /// failure is terminal for that connection only.
    pub async fn replay_frames(&self) -> Vec<Bytes> {
        let history = self.history.read().await;
        history.iter().map(Update::render_replay).collect()
    }

    async fn fan_out(&self, payload: Bytes) {
        let subscribers = self.subscribers.read().await;

        for (id, tx) in subscribers.iter() {
            self.try_deliver(*id, tx, payload.clone());
        }
    }

    fn try_deliver(&self, id: SubscriberId, tx: &mpsc::Sender<Bytes>, payload: Bytes) {
        match tx.try_send(payload) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::trace!(
                    topic = %self.name,
                    subscriber = id,
                    "Queue full, payload dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {
                // Subscriber is mid-teardown; its entry goes away shortly.
                tracing::trace!(
                    topic = %self.name,
                    subscriber = id,
                    "Subscriber gone, payload dropped"
                );
            }
        }
    }
}
