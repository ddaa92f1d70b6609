//! # livefeed
//!
//! `livefeed` is a minimal real-time broadcast server: viewers open a
//! long-lived HTTP GET and receive a live stream of HTML fragments as other
//! clients POST messages. No client-side scripting is involved; the page is
//! one never-ending HTML document.
//!
//! The core is the topic registry: per-topic subscriber sets fed through
//! bounded per-connection queues (slow viewers drop payloads instead of
//! blocking the poster) and a bounded history ring replayed to late joiners.
//!
//! ## Modules
//!
//! - `registry`: topics, subscriber fan-out, bounded history, ingest
//! - `server`: axum routes, per-connection drivers, the [`FeedServer`] entry point
//! - `error`: crate-wide error type
//!
//! ## Example
//!
//! ```no_run
//! use livefeed::{FeedServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> livefeed::Result<()> {
//!     let server = FeedServer::new(ServerConfig::default());
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod registry;
pub mod server;

pub use error::{Error, Result};
pub use registry::{RegistryConfig, Subscription, Topic, TopicRegistry, Update};
pub use server::{FeedServer, ServerConfig};
