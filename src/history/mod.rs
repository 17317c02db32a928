//! Chat history persistence
//!
//! Durable session records, the key-value backends that hold them, and
//! the store that ties them to the active conversation.

pub mod session;
pub mod store;

pub use session::{derive_title, new_session_id, ChatSession, DEFAULT_TITLE, TITLE_MAX_CHARS};
pub use store::{default_db_path, KvStore, MemoryStore, SessionStore, SledStore};
