//! Update values and rendered payload fragments
//!
//! An [`Update`] is the unit of broadcast and history: a UTC timestamp plus a
//! message that has already been escaped and trimmed at the ingest boundary.
//! Rendered forms are `Bytes`, so fan-out clones only bump a reference count.

use bytes::Bytes;
use chrono::Utc;

/// Timestamp layout used in rendered fragments (`YYYY-MM-DD HH:MM:SS`, UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single broadcast update
///
/// Immutable once constructed. The message is stored as delivered by the
/// ingest boundary; no further sanitizing happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    timestamp: String,
    message: String,
}

impl Update {
    /// Create an update stamped with the current UTC time
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            message: message.into(),
        }
    }

    /// Create an update with an explicit timestamp
    pub fn at(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            message: message.into(),
        }
    }

    /// The update's timestamp string
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The update's message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render the fragment pushed to live viewers
    pub fn render_live(&self) -> Bytes {
        Bytes::from(format!(
            "<div class=\"new\"><p>{}</p><time>{}</time></div>",
            self.message, self.timestamp
        ))
    }

    /// Render the fragment written during history replay
    pub fn render_replay(&self) -> Bytes {
        Bytes::from(format!(
            "<div><p>{}</p><time>{}</time></div>",
            self.message, self.timestamp
        ))
    }
}

/// Render the viewer-count fragment
///
/// The page header carries an empty `#nc` span; each fragment restyles its
/// `::before` content, so the newest one wins without any scripting.
pub fn count_fragment(count: usize) -> Bytes {
    Bytes::from(format!("<style>#nc::before{{content:\"{}\"}}</style>", count))
}
