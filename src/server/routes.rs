//! HTTP surface: routing, page head, and the ingest boundary
//!
//! `GET /` and `GET /:topic` open a never-ending HTML response driven by a
//! [`ConnectionDriver`]; `POST` to the same paths submits a message and
//! redirects back. Escaping, trimming, and the length bound all happen here,
//! before anything reaches the registry.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use bytes::Bytes;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::registry::TopicRegistry;
use crate::server::config::ServerConfig;
use crate::server::connection::ConnectionDriver;

/// Chunks buffered toward a client that reads slower than we write
const BODY_CHANNEL_CAPACITY: usize = 16;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TopicRegistry>,
    pub config: Arc<ServerConfig>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(feed_default).post(post_default))
        .route("/:topic", get(feed_topic).post(post_topic))
        .with_state(state)
}

async fn feed_default(State(state): State<AppState>) -> Response {
    let topic = state.config.default_topic.clone();
    open_feed(state, topic).await
}

async fn feed_topic(State(state): State<AppState>, Path(topic): Path<String>) -> Response {
    open_feed(state, topic).await
}

/// Subscribe, spawn the connection driver, and stream its output as the body
async fn open_feed(state: AppState, topic: String) -> Response {
    let subscription = state.registry.subscribe(&topic).await;
    let (tx, rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);
    let head = page_head(&state.config);

    let driver = ConnectionDriver::new(Arc::clone(&state.registry), subscription, tx, head);
    tokio::spawn(driver.run());

    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}

#[derive(Deserialize)]
struct PostForm {
    #[serde(default)]
    msg: String,
}

async fn post_default(State(state): State<AppState>, Form(form): Form<PostForm>) -> Redirect {
    let topic = state.config.default_topic.clone();
    ingest(&state, &topic, &form.msg).await;
    Redirect::to("/")
}

async fn post_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Form(form): Form<PostForm>,
) -> Redirect {
    ingest(&state, &topic, &form.msg).await;
    Redirect::to(&format!("/{}", topic))
}

/// Bound, escape, and trim a posted message before it reaches the registry
async fn ingest(state: &AppState, topic: &str, raw: &str) {
    if raw.len() > state.registry.config().max_msg_len {
        tracing::debug!(topic = %topic, len = raw.len(), "Oversized message rejected");
        return;
    }

    let escaped = html_escape(raw);
    state.registry.submit_message(topic, escaped.trim()).await;
}

/// Escape HTML-special characters the way the fragments expect
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(c),
        }
    }
    out
}

/// Leading portion of the page: head, viewer count, post form, opening main
///
/// The stylesheet is inlined so the server ships no asset directory. The
/// `#nc` span stays empty; count fragments streamed into the document restyle
/// its `::before` content.
fn page_head(config: &ServerConfig) -> Bytes {
    Bytes::from(format!(
        r#"<!doctype html>
<html>
<head>
<title>{title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
body {{ margin: 0 auto; max-width: 40em; font-family: sans-serif; }}
header {{ padding: 1em; border-bottom: 1px solid #ccc; }}
textarea {{ width: 100%; box-sizing: border-box; }}
main div {{ padding: .5em 1em; }}
main div.new {{ background: #ffd; }}
main time {{ display: block; font-size: .8em; color: #666; }}
</style>
</head>
<body>
<header>
	<div id="count">Being seen by <span id="nc"></span> connection(s)</div>
	<form method="POST">
		<textarea name="msg" placeholder="Start typing..." autofocus></textarea>
		<div><button>Post</button></div>
	</form>
</header>
<main>
"#,
        title = html_escape(&config.page_title)
    ))
}
