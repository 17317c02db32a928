//! Session persistence over a pluggable key-value backend
//!
//! Sessions live in an embedded `sled` database by default, one JSON
//! record per session plus a pointer key naming the active session.
//! The [`KvStore`] trait keeps the store testable with an in-memory
//! backend and leaves the door open for alternative engines.

use crate::config::StorageConfig;
use crate::error::{ChatlingError, Result};
use crate::history::session::{derive_title, validate_imported, ChatSession};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Key prefix for session records
const SESSION_PREFIX: &str = "session:";

/// Pointer key naming the currently active session
const CURRENT_KEY: &str = "current";

/// Minimal key-value surface the session store needs
///
/// Implementations must be safe to share across threads.
pub trait KvStore: Send + Sync {
    /// Fetch the raw bytes under a key, if present
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store bytes under a key, replacing any previous value
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys starting with the given prefix
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// `sled`-backed key-value store
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create a database at the given path
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if the database cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChatlingError::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }
        let db = sled::open(path)
            .map_err(|e| ChatlingError::Storage(format!("Failed to open database: {}", e)))?;
        Ok(Self { db })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| ChatlingError::Storage(format!("Get failed: {}", e)))?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value)
            .map_err(|e| ChatlingError::Storage(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatlingError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| ChatlingError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatlingError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) =
                entry.map_err(|e| ChatlingError::Storage(format!("Iteration failed: {}", e)))?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| ChatlingError::Storage(format!("Invalid key encoding: {}", e)))?;
            keys.push(key);
        }
        Ok(keys)
    }
}

/// In-memory key-value store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self
            .map
            .read()
            .map_err(|_| ChatlingError::Storage("Store lock poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| ChatlingError::Storage("Store lock poisoned".into()))?;
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| ChatlingError::Storage("Store lock poisoned".into()))?;
        map.remove(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let map = self
            .map
            .read()
            .map_err(|_| ChatlingError::Storage("Store lock poisoned".into()))?;
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Resolve the default database path in the user's data directory
///
/// # Errors
///
/// Returns `ChatlingError::Storage` if no data directory can be determined
pub fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "chatling", "chatling")
        .ok_or_else(|| ChatlingError::Storage("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().join("history.db"))
}

/// Persistent store of chat sessions
///
/// Each session is one record keyed by its ULID, so saving a chat never
/// rewrites unrelated sessions. A separate pointer key tracks which
/// session the user currently has open.
pub struct SessionStore {
    kv: Box<dyn KvStore>,
}

impl SessionStore {
    /// Create a store over an arbitrary backend
    pub fn new(kv: Box<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Open the on-disk store described by the storage configuration
    ///
    /// Uses the configured path when set, falling back to the
    /// platform data directory.
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if the database cannot be opened
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        debug!("Opening session store at {}", path.display());
        Ok(Self::new(Box::new(SledStore::open(path)?)))
    }

    fn session_key(id: &str) -> String {
        format!("{}{}", SESSION_PREFIX, id)
    }

    /// Persist one session record
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if serialization or the write fails
    pub fn save(&self, session: &ChatSession) -> Result<()> {
        let value = serde_json::to_vec(session)
            .map_err(|e| ChatlingError::Storage(format!("Serialization failed: {}", e)))?;
        self.kv.put(&Self::session_key(&session.id), &value)
    }

    /// Load one session by id
    ///
    /// Returns `Ok(None)` when the session does not exist.
    pub fn load_session(&self, id: &str) -> Result<Option<ChatSession>> {
        match self.kv.get(&Self::session_key(id))? {
            Some(bytes) => {
                let session = serde_json::from_slice(&bytes).map_err(|e| {
                    ChatlingError::Storage(format!("Deserialization failed: {}", e))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// List all sessions, newest first
    ///
    /// Records that no longer parse are skipped with a warning rather
    /// than failing the whole listing.
    pub fn sessions(&self) -> Result<Vec<ChatSession>> {
        let mut sessions = Vec::new();
        for key in self.kv.keys(SESSION_PREFIX)? {
            let Some(bytes) = self.kv.get(&key)? else {
                continue;
            };
            match serde_json::from_slice::<ChatSession>(&bytes) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!("Skipping corrupt session record {}: {}", key, e),
            }
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Id of the currently open session, if any
    pub fn current_id(&self) -> Result<Option<String>> {
        match self.kv.get(CURRENT_KEY)? {
            Some(bytes) => {
                let id = String::from_utf8(bytes)
                    .map_err(|e| ChatlingError::Storage(format!("Invalid pointer: {}", e)))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Set or clear the current-session pointer
    pub fn set_current(&self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => self.kv.put(CURRENT_KEY, id.as_bytes()),
            None => self.kv.remove(CURRENT_KEY),
        }
    }

    /// Save the conversation the user currently has open
    ///
    /// Chats holding only the greeting are not worth keeping, so a
    /// message list of one or fewer entries is silently skipped. When a
    /// current session exists its messages are replaced and its title
    /// re-derived; otherwise a new session is created and becomes
    /// current. Returns the id of the saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if persistence fails
    pub fn save_current_chat(&self, messages: &[crate::chat::Message]) -> Result<Option<String>> {
        if messages.len() <= 1 {
            debug!("Skipping save of empty conversation");
            return Ok(None);
        }

        let mut session = match self.current_id()? {
            Some(id) => match self.load_session(&id)? {
                Some(session) => session,
                // Pointer outlived its session; start a fresh one.
                None => ChatSession::new(None),
            },
            None => ChatSession::new(None),
        };

        session.messages = messages.to_vec();
        session.title = derive_title(messages);
        session.touch();
        self.save(&session)?;
        self.set_current(Some(&session.id))?;
        Ok(Some(session.id))
    }

    /// Create an empty session and make it current
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if persistence fails
    pub fn create_session(&self, title: Option<String>) -> Result<ChatSession> {
        let session = ChatSession::new(title);
        self.save(&session)?;
        self.set_current(Some(&session.id))?;
        Ok(session)
    }

    /// Apply a mutation to one session, refreshing its timestamp
    ///
    /// Returns false without error for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if loading or saving fails
    pub fn update_session<F>(&self, id: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut ChatSession),
    {
        let Some(mut session) = self.load_session(id)? else {
            return Ok(false);
        };
        f(&mut session);
        session.touch();
        self.save(&session)?;
        Ok(true)
    }

    /// Delete one session, clearing the pointer if it was current
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::Storage` if the session does not exist or
    /// the delete fails
    pub fn delete_session(&self, id: &str) -> Result<()> {
        if self.load_session(id)?.is_none() {
            return Err(ChatlingError::Storage(format!("No such session: {}", id)).into());
        }
        self.kv.remove(&Self::session_key(id))?;
        if self.current_id()?.as_deref() == Some(id) {
            self.set_current(None)?;
        }
        Ok(())
    }

    /// Delete every session and the current-session pointer
    pub fn clear_all(&self) -> Result<()> {
        for key in self.kv.keys(SESSION_PREFIX)? {
            self.kv.remove(&key)?;
        }
        self.kv.remove(CURRENT_KEY)
    }

    /// Export all sessions as a pretty-printed JSON array, newest first
    pub fn export_all(&self) -> Result<String> {
        let sessions = self.sessions()?;
        serde_json::to_string_pretty(&sessions)
            .map_err(|e| ChatlingError::Storage(format!("Serialization failed: {}", e)).into())
    }

    /// Import sessions from a JSON export, returning how many were kept
    ///
    /// Each entry is validated independently: missing ids are generated
    /// fresh and entries that do not look like sessions are skipped, so
    /// one bad record never aborts the import. Imported sessions are
    /// merged into the existing set.
    ///
    /// # Errors
    ///
    /// Returns `ChatlingError::InvalidInput` when the payload is not a
    /// JSON array
    pub fn import_all(&self, raw: &str) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ChatlingError::InvalidInput(format!("Import is not valid JSON: {}", e)))?;
        let serde_json::Value::Array(entries) = value else {
            return Err(ChatlingError::InvalidInput("Import payload must be a JSON array".into()).into());
        };

        let mut imported = 0;
        for entry in entries {
            if let Some(session) = validate_imported(entry) {
                self.save(&session)?;
                imported += 1;
            }
        }
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Conversation, Draft};

    fn memory_store() -> SessionStore {
        SessionStore::new(Box::new(MemoryStore::new()))
    }

    fn conversation_with_user(text: &str) -> Conversation {
        let mut conversation = Conversation::new("Hello there");
        conversation.append(Draft::user(text));
        conversation
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = memory_store();
        let session = ChatSession::new(Some("round trip".to_string()));
        store.save(&session).unwrap();

        let loaded = store.load_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.title, "round trip");
    }

    #[test]
    fn test_load_missing_session_is_none() {
        let store = memory_store();
        assert!(store.load_session("nope").unwrap().is_none());
    }

    #[test]
    fn test_save_current_chat_skips_greeting_only() {
        let store = memory_store();
        let conversation = Conversation::new("Hello there");
        let saved = store.save_current_chat(conversation.messages()).unwrap();
        assert!(saved.is_none());
        assert!(store.sessions().unwrap().is_empty());
    }

    #[test]
    fn test_save_current_chat_creates_and_points() {
        let store = memory_store();
        let conversation = conversation_with_user("Hello");

        let id = store
            .save_current_chat(conversation.messages())
            .unwrap()
            .unwrap();
        assert_eq!(store.current_id().unwrap().as_deref(), Some(id.as_str()));

        let session = store.load_session(&id).unwrap().unwrap();
        assert_eq!(session.title, "Hello");
        assert_eq!(session.messages.len(), 2);
    }

    #[test]
    fn test_save_current_chat_updates_existing() {
        let store = memory_store();
        let mut conversation = conversation_with_user("first question");
        let id = store
            .save_current_chat(conversation.messages())
            .unwrap()
            .unwrap();

        conversation.append(Draft::assistant("an answer"));
        let id_again = store
            .save_current_chat(conversation.messages())
            .unwrap()
            .unwrap();

        assert_eq!(id, id_again);
        assert_eq!(store.sessions().unwrap().len(), 1);
        let session = store.load_session(&id).unwrap().unwrap();
        assert_eq!(session.messages.len(), 3);
    }

    #[test]
    fn test_delete_clears_current_pointer() {
        let store = memory_store();
        let conversation = conversation_with_user("to be deleted");
        let id = store
            .save_current_chat(conversation.messages())
            .unwrap()
            .unwrap();

        store.delete_session(&id).unwrap();
        assert!(store.current_id().unwrap().is_none());
        assert!(store.load_session(&id).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_session_errors() {
        let store = memory_store();
        assert!(store.delete_session("absent").is_err());
    }

    #[test]
    fn test_create_session_becomes_current() {
        let store = memory_store();
        let session = store.create_session(Some("fresh".to_string())).unwrap();
        assert_eq!(
            store.current_id().unwrap().as_deref(),
            Some(session.id.as_str())
        );
        assert!(session.messages.is_empty());
    }

    #[test]
    fn test_update_session_applies_mutation() {
        let store = memory_store();
        let session = store.create_session(None).unwrap();
        let before = session.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(2));
        let updated = store
            .update_session(&session.id, |s| s.title = "renamed".to_string())
            .unwrap();
        assert!(updated);

        let loaded = store.load_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.title, "renamed");
        assert!(loaded.updated_at > before);
    }

    #[test]
    fn test_update_session_unknown_id_is_false() {
        let store = memory_store();
        assert!(!store.update_session("absent", |_| {}).unwrap());
    }

    #[test]
    fn test_sessions_sorted_newest_first() {
        let store = memory_store();
        let mut older = ChatSession::new(Some("older".to_string()));
        older.updated_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let newer = ChatSession::new(Some("newer".to_string()));
        store.save(&older).unwrap();
        store.save(&newer).unwrap();

        let sessions = store.sessions().unwrap();
        assert_eq!(sessions[0].title, "newer");
        assert_eq!(sessions[1].title, "older");
    }

    #[test]
    fn test_sessions_skips_corrupt_records() {
        let kv = MemoryStore::new();
        kv.put("session:bad", b"not json").unwrap();
        let store = SessionStore::new(Box::new(kv));

        let session = ChatSession::new(Some("good".to_string()));
        store.save(&session).unwrap();

        let sessions = store.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "good");
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let store = memory_store();
        let conversation = conversation_with_user("gone soon");
        store.save_current_chat(conversation.messages()).unwrap();

        store.clear_all().unwrap();
        assert!(store.sessions().unwrap().is_empty());
        assert!(store.current_id().unwrap().is_none());
    }

    #[test]
    fn test_export_import_round_trip() {
        let store = memory_store();
        let conversation = conversation_with_user("exported chat");
        store.save_current_chat(conversation.messages()).unwrap();

        let exported = store.export_all().unwrap();

        let other = memory_store();
        let imported = other.import_all(&exported).unwrap();
        assert_eq!(imported, 1);

        let sessions = other.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "exported chat");
        assert_eq!(sessions[0].messages.len(), 2);
    }

    #[test]
    fn test_import_skips_bad_entries() {
        let store = memory_store();
        let payload = r#"[
            {"title": "missing id", "messages": []},
            "definitely not a session",
            42
        ]"#;
        let imported = store.import_all(payload).unwrap();
        assert_eq!(imported, 1);
        assert_eq!(store.sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_import_rejects_non_array() {
        let store = memory_store();
        assert!(store.import_all(r#"{"not": "an array"}"#).is_err());
        assert!(store.import_all("{broken").is_err());
    }

    #[test]
    fn test_sled_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = SessionStore::new(Box::new(SledStore::open(&path).unwrap()));
            let conversation = conversation_with_user("durable");
            store.save_current_chat(conversation.messages()).unwrap();
        }

        let store = SessionStore::new(Box::new(SledStore::open(&path).unwrap()));
        let sessions = store.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "durable");
    }
}
