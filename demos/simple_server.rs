//! Simple broadcast server example
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:8080
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:8080
//!   cargo run --example simple_server 127.0.0.1:3000     # binds to 127.0.0.1:3000
//!   PORT=9000 cargo run --example simple_server          # binds to 0.0.0.0:9000
//!
//! Then open http://localhost:8080/ in a browser (or several), type a
//! message, and post. Every open tab sees it live; tabs opened later get
//! the recent history first. http://localhost:8080/some-topic serves an
//! independent feed.

use std::net::SocketAddr;

use livefeed::{FeedServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:3000" -> 127.0.0.1:3000
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "0.0.0.0:9000" -> 0.0.0.0:9000
fn parse_bind_addr(arg: &str, default_port: u16) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("livefeed=debug".parse()?),
        )
        .init();

    let default_port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let bind_addr = match std::env::args().nth(1) {
        Some(arg) => match parse_bind_addr(&arg, default_port) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Usage: simple_server [BIND_ADDR]");
                std::process::exit(1);
            }
        },
        None => SocketAddr::from(([0, 0, 0, 0], default_port)),
    };

    let server = FeedServer::new(ServerConfig::with_addr(bind_addr));

    println!("Serving on http://{}", server.bind_addr());
    println!("Open it in a few tabs and start posting.");

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
