//! Chat messages and their persisted, keyed log.
//!
//! A log is an ordered list of messages stored as a JSON array under one storage key.
//! A missing or unparsable value loads as the feature's seed (a system message or nothing).

use crate::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// System messages seed context and are never shown.
    pub fn is_visible(&self) -> bool {
        self.role != Role::System
    }
}

/// Messages that are shown to the user, in order.
pub fn visible(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| m.is_visible())
}

/// Storage slot for one feature's messages plus the default used when the slot is empty.
#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
    seed: Vec<Message>,
}

impl MessageLog {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, seed: Vec<Message>) -> Self {
        Self {
            store,
            key: key.into(),
            seed,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored messages, or the seed when nothing valid is stored. Never fails: read errors are logged.
    pub fn load(&self) -> Vec<Message> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.seed.clone(),
            Err(e) => {
                log::warn!("message log {}: read failed, using default: {}", self.key, e);
                return self.seed.clone();
            }
        };
        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                log::warn!("message log {}: stored value unparsable, using default: {}", self.key, e);
                self.seed.clone()
            }
        }
    }

    /// Serialize and overwrite the stored value.
    pub fn save(&self, messages: &[Message]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(messages).map_err(StorageError::Encode)?;
        self.store.set(&self.key, &raw)
    }

    /// Reset the stored value to the seed and return it.
    pub fn clear(&self) -> Result<Vec<Message>, StorageError> {
        let seed = self.seed.clone();
        self.save(&seed)?;
        Ok(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn log_with_seed(seed: Vec<Message>) -> (Arc<MemoryStore>, MessageLog) {
        let store = Arc::new(MemoryStore::new());
        let log = MessageLog::new(store.clone(), "test_messages", seed);
        (store, log)
    }

    #[test]
    fn load_without_stored_value_returns_seed() {
        let (_, log) = log_with_seed(vec![Message::system("seed")]);
        assert_eq!(log.load(), vec![Message::system("seed")]);

        let (_, empty) = log_with_seed(Vec::new());
        assert!(empty.load().is_empty());
    }

    #[test]
    fn save_then_load_returns_same_messages() {
        let (_, log) = log_with_seed(vec![Message::system("seed")]);
        let messages = vec![
            Message::system("seed"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        log.save(&messages).unwrap();
        assert_eq!(log.load(), messages);
    }

    #[test]
    fn unparsable_value_falls_back_to_seed() {
        let (store, log) = log_with_seed(vec![Message::system("seed")]);
        store.set("test_messages", "{not an array").unwrap();
        assert_eq!(log.load(), vec![Message::system("seed")]);
        store
            .set("test_messages", r#"[{"role":"robot","content":"x"}]"#)
            .unwrap();
        assert_eq!(log.load(), vec![Message::system("seed")]);
    }

    #[test]
    fn stored_format_is_role_content_array() {
        let (store, log) = log_with_seed(Vec::new());
        log.save(&[Message::user("q")]).unwrap();
        let raw = store.get("test_messages").unwrap().unwrap();
        assert_eq!(raw, r#"[{"role":"user","content":"q"}]"#);
    }

    #[test]
    fn clear_restores_seed() {
        let (_, log) = log_with_seed(vec![Message::system("seed")]);
        log.save(&[Message::system("seed"), Message::user("hi")]).unwrap();
        let cleared = log.clear().unwrap();
        assert_eq!(cleared, vec![Message::system("seed")]);
        assert_eq!(log.load(), cleared);
    }

    #[test]
    fn visible_skips_system_messages() {
        let messages = vec![
            Message::system("seed"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let shown: Vec<&str> = visible(&messages).map(|m| m.content.as_str()).collect();
        assert_eq!(shown, vec!["hi", "hello"]);
    }
}
