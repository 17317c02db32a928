//! Turn-by-turn coordination of conversation, completion, and history
//!
//! The orchestrator is the single write path for a chat turn: it
//! appends the user's message optimistically, runs the completion, and
//! appends either the assistant reply or a synthesized error message,
//! then persists the session. Callers never see a raw provider error
//! from a turn; the conversation always gains an assistant message.

use crate::chat::client::{CompletionClient, Reply};
use crate::chat::conversation::Conversation;
use crate::chat::message::{Draft, Message, MessageMetadata};
use crate::error::{classify, ChatlingError, Result};
use crate::history::SessionStore;
use tracing::{debug, warn};

/// Assistant copy shown when the provider is rate limiting us
pub const RATE_LIMITED_REPLY: &str =
    "I'm receiving too many requests right now. Please wait a moment and try again.";

/// Assistant copy shown when the provider could not be reached
pub const NETWORK_REPLY: &str =
    "I couldn't reach the assistant service. Please check your connection and try again.";

/// Assistant copy shown when the credential was rejected
pub const UNAUTHORIZED_REPLY: &str =
    "I couldn't authenticate with the assistant service. Please check your API key.";

/// Assistant copy shown for any other failure
pub const GENERIC_FAILURE_REPLY: &str =
    "I apologize, but something went wrong while processing your request. Please try again.";

/// Pick the assistant copy for a failed completion
fn failure_copy(err: &anyhow::Error) -> &'static str {
    match classify(err) {
        Some(ChatlingError::RateLimited(_)) => RATE_LIMITED_REPLY,
        Some(ChatlingError::Network(_)) | Some(ChatlingError::Http(_)) => NETWORK_REPLY,
        Some(ChatlingError::Unauthorized(_)) | Some(ChatlingError::Forbidden(_)) => {
            UNAUTHORIZED_REPLY
        }
        _ => GENERIC_FAILURE_REPLY,
    }
}

/// Outcome of one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The provider answered
    Replied,
    /// The provider failed and an error message was synthesized
    Failed,
}

/// Clears the in-flight flag when dropped
///
/// Held across the completion await so the flag is released even when
/// the turn's future is dropped before it resolves.
struct PendingGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> PendingGuard<'a> {
    fn arm(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

/// Coordinates one conversation against a completion client and store
pub struct ChatOrchestrator {
    conversation: Conversation,
    client: CompletionClient,
    store: SessionStore,
    pending: bool,
}

impl ChatOrchestrator {
    /// Create an orchestrator over a fresh conversation
    pub fn new(client: CompletionClient, store: SessionStore, greeting: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(greeting),
            client,
            store,
            pending: false,
        }
    }

    /// Messages of the active conversation, oldest first
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Whether a completion request is currently in flight
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The session store backing this orchestrator
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resume a stored session, making it current
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if the session does not exist or
    /// cannot be loaded
    pub fn resume(&mut self, session_id: &str) -> Result<()> {
        let session = self
            .store
            .load_session(session_id)?
            .ok_or_else(|| ChatlingError::Storage(format!("No such session: {}", session_id)))?;
        debug!("Resuming session {} ({})", session.id, session.title);
        self.conversation.restore(session.messages);
        self.store.set_current(Some(session_id))?;
        Ok(())
    }

    /// Start a new chat, detaching from the current session
    ///
    /// The previous session stays in the store untouched; the
    /// conversation resets to its greeting.
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if clearing the pointer fails
    pub fn clear(&mut self) -> Result<()> {
        self.conversation.clear();
        self.store.set_current(None)
    }

    /// Run one chat turn
    ///
    /// Appends the user message, asks the provider for a reply, appends
    /// the assistant message (real or synthesized), and saves the
    /// session. Provider failures are absorbed into the conversation;
    /// only input validation, single-flight, and storage problems
    /// surface as errors.
    ///
    /// # Errors
    ///
    /// * `ChatlingError::InvalidInput` - the text is empty after trimming
    /// * `ChatlingError::RequestInFlight` - a previous turn has not finished
    /// * `ChatlingError::Storage` - the session could not be saved
    pub async fn send_message(&mut self, text: &str) -> Result<TurnOutcome> {
        if self.pending {
            return Err(ChatlingError::RequestInFlight.into());
        }
        let text = self.client.validate_input(text)?;

        self.conversation.append(Draft::user(text.clone()));

        // History for the wire excludes the turn just appended; the
        // client adds it as the final user entry itself.
        let history_len = self.conversation.len() - 1;
        let result = {
            // The guard clears the flag when this scope ends, including
            // when the caller drops the future mid-await.
            let _pending = PendingGuard::arm(&mut self.pending);
            self.client
                .complete(&self.conversation.messages()[..history_len], &text)
                .await
        };

        let outcome = match result {
            Ok(reply) => {
                self.append_reply(reply);
                TurnOutcome::Replied
            }
            Err(e) => {
                warn!("Completion failed: {:#}", e);
                self.conversation.append(Draft::assistant(failure_copy(&e)));
                TurnOutcome::Failed
            }
        };

        self.store.save_current_chat(self.conversation.messages())?;
        Ok(outcome)
    }

    fn append_reply(&mut self, reply: Reply) {
        let metadata = MessageMetadata {
            model: Some(reply.model),
            processing_time_ms: Some(reply.processing_time_ms),
            tokens: reply.usage.map(|u| u.total_tokens),
        };
        self.conversation
            .append(Draft::assistant(reply.text).with_metadata(metadata));
    }
}
