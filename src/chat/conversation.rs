//! Conversation state for the active chat session
//!
//! The conversation owns the ordered message list while a chat is live.
//! Messages are append-only; ids are assigned sequentially at append time
//! and never reused within a session. The only way to remove messages is
//! `clear`, which resets to the greeting and restarts the counter.

use crate::chat::message::{Draft, Message, Sender};
use chrono::Utc;

/// In-memory ordered message list for the active session
///
/// # Examples
///
/// ```
/// use chatling::chat::{Conversation, Draft};
///
/// let mut conversation = Conversation::new("Hello! How can I help?");
/// assert_eq!(conversation.len(), 1);
///
/// let msg = conversation.append(Draft::user("Hi!"));
/// assert_eq!(msg.id, 2);
/// ```
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    greeting: String,
}

impl Conversation {
    /// Creates a conversation seeded with the assistant greeting
    ///
    /// The greeting is message id 1; real exchanges start at id 2.
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let mut conversation = Self {
            messages: Vec::new(),
            next_id: 1,
            greeting,
        };
        conversation.push_greeting();
        conversation
    }

    fn push_greeting(&mut self) {
        let greeting = Draft::assistant(self.greeting.clone());
        self.push(greeting);
    }

    fn push(&mut self, draft: Draft) -> &Message {
        let message = Message {
            id: self.next_id,
            content: draft.content,
            kind: draft.kind,
            sender: draft.sender,
            timestamp: Utc::now(),
            attachment: draft.attachment,
            metadata: draft.metadata,
        };
        self.next_id += 1;
        let idx = self.messages.len();
        self.messages.push(message);
        &self.messages[idx]
    }

    /// Appends a draft, assigning the next id and the current time
    ///
    /// Returns the stored message. Never fails; the list only grows.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatling::chat::{Conversation, Draft};
    ///
    /// let mut conversation = Conversation::new("Welcome");
    /// let first = conversation.append(Draft::user("one")).id;
    /// let second = conversation.append(Draft::user("two")).id;
    /// assert!(second > first);
    /// ```
    pub fn append(&mut self, draft: Draft) -> &Message {
        self.push(draft)
    }

    /// Resets the list to the greeting alone and restarts the id counter
    pub fn clear(&mut self) {
        self.messages.clear();
        self.next_id = 1;
        self.push_greeting();
    }

    /// Replaces the live list with a persisted session's messages
    ///
    /// Used when resuming a session. The id counter moves past the
    /// highest restored id so monotonicity holds across the restore. An
    /// empty slice falls back to a fresh greeting.
    pub fn restore(&mut self, messages: Vec<Message>) {
        if messages.is_empty() {
            self.clear();
            return;
        }
        self.next_id = messages.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        self.messages = messages;
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages, greeting included
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when even the greeting is absent (never after construction)
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The first user message, if any
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.sender == Sender::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{MessageKind, MessageMetadata};

    #[test]
    fn test_new_conversation_has_greeting() {
        let conversation = Conversation::new("Welcome!");
        assert_eq!(conversation.len(), 1);
        let greeting = &conversation.messages()[0];
        assert_eq!(greeting.id, 1);
        assert_eq!(greeting.content, "Welcome!");
        assert_eq!(greeting.sender, Sender::Assistant);
        assert_eq!(greeting.kind, MessageKind::Text);
    }

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let mut conversation = Conversation::new("Hi");
        let mut previous = conversation.messages()[0].id;
        for i in 0..20 {
            let id = conversation.append(Draft::user(format!("msg {}", i))).id;
            assert!(id > previous, "ids must strictly increase");
            previous = id;
        }
        // All ids unique
        let mut ids: Vec<u64> = conversation.messages().iter().map(|m| m.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), conversation.len());
    }

    #[test]
    fn test_append_returns_stored_message() {
        let mut conversation = Conversation::new("Hi");
        let message = conversation.append(
            Draft::assistant("Reply").with_metadata(MessageMetadata {
                model: Some("m".to_string()),
                processing_time_ms: Some(5),
                tokens: Some(3),
            }),
        );
        assert_eq!(message.id, 2);
        assert_eq!(message.content, "Reply");
        assert!(message.metadata.is_some());
    }

    #[test]
    fn test_append_sets_timestamp() {
        let before = Utc::now();
        let mut conversation = Conversation::new("Hi");
        let ts = conversation.append(Draft::user("x")).timestamp;
        assert!(ts >= before);
        assert!(ts <= Utc::now());
    }

    #[test]
    fn test_clear_resets_to_greeting_and_counter() {
        let mut conversation = Conversation::new("Welcome!");
        conversation.append(Draft::user("one"));
        conversation.append(Draft::assistant("two"));
        assert_eq!(conversation.len(), 3);

        conversation.clear();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].content, "Welcome!");
        assert_eq!(conversation.messages()[0].id, 1);

        // Counter restarted: next append gets id 2 again
        assert_eq!(conversation.append(Draft::user("again")).id, 2);
    }

    #[test]
    fn test_restore_continues_id_sequence() {
        let mut conversation = Conversation::new("Hi");
        conversation.append(Draft::user("one"));
        conversation.append(Draft::assistant("two"));
        let saved = conversation.messages().to_vec();

        let mut resumed = Conversation::new("Hi");
        resumed.restore(saved);
        assert_eq!(resumed.len(), 3);
        assert_eq!(resumed.append(Draft::user("three")).id, 4);
    }

    #[test]
    fn test_restore_empty_falls_back_to_greeting() {
        let mut conversation = Conversation::new("Hi");
        conversation.append(Draft::user("one"));
        conversation.restore(Vec::new());
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].content, "Hi");
    }

    #[test]
    fn test_first_user_message() {
        let mut conversation = Conversation::new("Hi");
        assert!(conversation.first_user_message().is_none());
        conversation.append(Draft::user("question"));
        conversation.append(Draft::user("followup"));
        assert_eq!(
            conversation.first_user_message().unwrap().content,
            "question"
        );
    }

    #[test]
    fn test_is_empty_never_after_construction() {
        let conversation = Conversation::new("Hi");
        assert!(!conversation.is_empty());
    }
}
