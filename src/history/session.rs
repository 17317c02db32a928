//! Chat session records and title derivation
//!
//! A session is the durable form of a conversation: a ULID identity, a
//! derived title, the full message list, and creation/update timestamps.
//! Sessions serialize to plain JSON with ISO-8601 dates, which is also
//! the export/import interchange format.

use crate::chat::message::Message;
use crate::chat::truncate_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Title used when no user message exists to derive one from
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum characters of the first user message kept in a title
pub const TITLE_MAX_CHARS: usize = 50;

/// A persisted chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier (ULID, creation-time sortable)
    pub id: String,

    /// Human-readable title derived from the first user message
    pub title: String,

    /// Ordered message list
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last mutation time; refreshed on every update
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session with a fresh ULID
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::history::ChatSession;
    ///
    /// let session = ChatSession::new(None);
    /// assert_eq!(session.title, "New Chat");
    /// assert!(session.messages.is_empty());
    /// ```
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_session_id(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the `updated_at` timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Generate a new ULID for a session
///
/// ULIDs are preferred over UUIDs as they are sortable by timestamp and
/// more human-readable.
///
/// # Examples
///
/// ```
/// use chatling::history::new_session_id;
///
/// let id = new_session_id();
/// assert_eq!(id.len(), 26);
/// ```
pub fn new_session_id() -> String {
    Ulid::new().to_string()
}

/// Derive a session title from its message list
///
/// The first user message wins, truncated to [`TITLE_MAX_CHARS`]
/// characters with a `...` suffix when it was longer. Without a user
/// message the title falls back to [`DEFAULT_TITLE`].
///
/// # Examples
///
/// ```
/// use chatling::history::derive_title;
///
/// assert_eq!(derive_title(&[]), "New Chat");
/// ```
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first_user) = messages.iter().find(|m| m.is_user()) else {
        return DEFAULT_TITLE.to_string();
    };

    let content = &first_user.content;
    if content.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", truncate_chars(content, TITLE_MAX_CHARS))
    } else if content.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        content.clone()
    }
}

/// Lenient session shape used during import
///
/// Imported data may come from older exports or hand-edited files, so
/// identity and timestamps are optional and repaired; messages must
/// parse or the whole entry is rejected.
#[derive(Debug, Deserialize)]
struct RawSession {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Validate one imported JSON value as a session
///
/// Missing ids are generated fresh and missing timestamps filled with
/// the current time. Returns `None` when the value does not look like a
/// session at all, letting the caller skip it without failing the whole
/// import.
pub fn validate_imported(value: serde_json::Value) -> Option<ChatSession> {
    let raw: RawSession = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Skipping unreadable session during import: {}", e);
            return None;
        }
    };

    let now = Utc::now();
    let id = match raw.id {
        Some(id) if !id.is_empty() => id,
        _ => new_session_id(),
    };
    let title = match raw.title {
        Some(title) if !title.is_empty() => title,
        _ => derive_title(&raw.messages),
    };

    Some(ChatSession {
        id,
        title,
        messages: raw.messages,
        created_at: raw.created_at.unwrap_or(now),
        updated_at: raw.updated_at.unwrap_or(now),
    })
}
