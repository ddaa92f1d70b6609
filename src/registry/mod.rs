//! Topic registry: fan-out and history replay
//!
//! The registry owns every live topic and routes posted updates from the
//! ingest boundary to all of a topic's subscriber queues.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<TopicRegistry>
//!                   ┌─────────────────────────┐
//!                   │ topics: HashMap<Name,   │
//!                   │   Topic {               │
//!                   │     subscribers,        │
//!                   │     history,            │
//!                   │   }                     │
//!                   │ >                       │
//!                   └───────────┬─────────────┘
//!                               │
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!   [POST handler]         [Viewer]               [Viewer]
//!   submit_message()       rx.recv()              rx.recv()
//!        │                      │                      │
//!        └──► topic.broadcast() ──► try_send ──► streaming response
//! ```
//!
//! # Delivery policy
//!
//! Every subscriber has a bounded queue; broadcasts `try_send` into each one
//! and silently drop the payload for any queue that is full. A stalled viewer
//! can never block the poster or other viewers, at the cost of gaps in that
//! viewer's feed.
//!
//! Rendered payloads are `bytes::Bytes`, so all subscribers share one
//! allocation per broadcast.

pub mod config;
pub mod store;
pub mod topic;
pub mod update;

pub use config::RegistryConfig;
pub use store::{Subscription, TopicRegistry};
pub use topic::{SubscriberId, Topic};
pub use update::{count_fragment, Update, TIMESTAMP_FORMAT};
