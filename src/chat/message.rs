//! Chat message data model
//!
//! Domain-level messages carry more than the wire format: a per-session
//! id, a kind, an optional image attachment, and reply metadata. Ids and
//! timestamps are assigned by the [`Conversation`](super::Conversation)
//! at append time, so callers build a [`Draft`] and the conversation
//! finishes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a message body represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Plain text
    Text,
    /// A user-supplied image
    Image,
    /// An image produced by the assistant
    GeneratedImage,
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Text
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The human user
    User,
    /// The AI assistant
    Assistant,
}

/// Image attachment for image-bearing messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Location of the image
    pub url: String,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Caption shown alongside the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Metadata attached to assistant replies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Model that produced the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Wall-clock processing time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Total tokens reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<usize>,
}

/// A finished message within a chat session
///
/// Messages are append-only: once stored, every field is immutable.
/// Ids are unique within a session and strictly increase with insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Per-session identifier, monotonically assigned
    pub id: u64,
    /// Text body; may be empty for pure-image messages
    pub content: String,
    /// What the body represents
    #[serde(default)]
    pub kind: MessageKind,
    /// Who authored the message
    pub sender: Sender,
    /// Creation time, set at append (ISO-8601 in serialized form)
    pub timestamp: DateTime<Utc>,
    /// Image payload for image-bearing messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Reply metadata; only assistant messages carry this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Whether this message came from the user
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// A message awaiting id and timestamp assignment
///
/// # Examples
///
/// ```
/// use chatling::chat::{Draft, Sender};
///
/// let draft = Draft::user("Hello!");
/// assert_eq!(draft.sender, Sender::User);
/// ```
#[derive(Debug, Clone)]
pub struct Draft {
    /// Text body
    pub content: String,
    /// What the body represents
    pub kind: MessageKind,
    /// Who authored the message
    pub sender: Sender,
    /// Image payload for image-bearing messages
    pub attachment: Option<Attachment>,
    /// Reply metadata
    pub metadata: Option<MessageMetadata>,
}

impl Draft {
    /// Creates a user text draft
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Text,
            sender: Sender::User,
            attachment: None,
            metadata: None,
        }
    }

    /// Creates an assistant text draft
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Text,
            sender: Sender::Assistant,
            attachment: None,
            metadata: None,
        }
    }

    /// Attach an image to this draft
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::chat::{Attachment, Draft, MessageKind};
    ///
    /// let draft = Draft::user("")
    ///     .with_kind(MessageKind::Image)
    ///     .with_attachment(Attachment {
    ///         url: "https://example.com/cat.png".into(),
    ///         alt: Some("a cat".into()),
    ///         caption: None,
    ///     });
    /// assert!(draft.attachment.is_some());
    /// ```
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Override the message kind
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach reply metadata
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
