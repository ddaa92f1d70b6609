//! HTTP server: listener, routes, and connection drivers
//!
//! This module provides:
//! - The axum router and request handlers (page head, ingest, redirects)
//! - The per-connection lifecycle driver behind each streaming response
//! - The [`FeedServer`] entry point with graceful shutdown

pub mod config;
pub mod connection;
pub mod listener;
pub mod routes;

pub use config::ServerConfig;
pub use connection::ConnectionDriver;
pub use listener::FeedServer;
pub use routes::{router, AppState};
