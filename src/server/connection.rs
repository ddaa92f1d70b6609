//! Per-connection lifecycle driver
//!
//! One driver task runs for each open viewer connection. It writes the page
//! head, replays the topic's history, announces the new viewer count, then
//! loops relaying queued payloads or keepalive bytes until a write fails.
//!
//! The response body is fed through an mpsc channel; hyper drops the
//! receiving side when the peer disconnects, so a failed send is the
//! disconnect signal. Teardown (unsubscribe plus a count announcement for
//! the remaining viewers) runs at the end of the task on every exit path,
//! including a failure during replay.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::registry::{Subscription, Topic, TopicRegistry};

/// Sender side of the streaming response body
pub type BodySender = mpsc::Sender<Result<Bytes, Infallible>>;

/// Neutral filler byte written when a quiet interval elapses, to defeat
/// idle-connection timeouts in proxies and browsers
const KEEPALIVE: Bytes = Bytes::from_static(b" ");

/// The peer closed the connection; nothing more can be written
struct Disconnected;

/// Drives one viewer connection from replay to teardown
pub struct ConnectionDriver {
    registry: Arc<TopicRegistry>,
    subscription: Subscription,
    out: BodySender,
    head: Bytes,
}

impl ConnectionDriver {
    /// Create a driver for an open subscription
    ///
    /// `head` is the framing header written before any history frame.
    pub fn new(
        registry: Arc<TopicRegistry>,
        subscription: Subscription,
        out: BodySender,
        head: Bytes,
    ) -> Self {
        Self {
            registry,
            subscription,
            out,
            head,
        }
    }

    /// Run the connection to completion
    pub async fn run(self) {
        let ConnectionDriver {
            registry,
            subscription,
            out,
            head,
        } = self;
        let Subscription { topic, id, mut rx } = subscription;
        let name = topic.name().to_string();

        if stream(&registry, &topic, &mut rx, &out, head).await.is_err() {
            tracing::debug!(topic = %name, subscriber = id, "Viewer disconnected");
        }

        registry.unsubscribe(&name, id).await;
        topic.announce_count().await;

        let remaining = topic.subscriber_count().await;
        tracing::debug!(
            topic = %name,
            subscriber = id,
            subscribers = remaining,
            "Connection closed"
        );
    }
}

async fn stream(
    registry: &TopicRegistry,
    topic: &Topic,
    rx: &mut mpsc::Receiver<Bytes>,
    out: &BodySender,
    head: Bytes,
) -> Result<(), Disconnected> {
    write(out, head).await?;

    for frame in topic.replay_frames().await {
        write(out, frame).await?;
    }

    // Announce after replay so this connection sees itself counted; the
    // fragment arrives through our own queue like any other payload.
    topic.announce_count().await;

    let mut ping = interval(registry.config().ping_rate);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() fires immediately; the first keepalive is due one full
    // period after the replay, not right away.
    ping.reset();

    loop {
        tokio::select! {
            payload = rx.recv() => match payload {
                Some(payload) => {
                    write(out, payload).await?;
                    ping.reset();
                }
                // Queue closed underneath us; nothing left to relay.
                None => return Ok(()),
            },
            _ = ping.tick() => {
                write(out, KEEPALIVE.clone()).await?;
            }
        }
    }
}

async fn write(out: &BodySender, chunk: Bytes) -> Result<(), Disconnected> {
    out.send(Ok(chunk)).await.map_err(|_| Disconnected)
}
