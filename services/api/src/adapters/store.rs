//! services/api/src/adapters/store.rs
//!
//! This module contains the flat-file store adapter, the concrete
//! implementation of the `ConversationStore` port from the `core` crate.
//! Every conversation lives in one JSON document keyed by session id, and
//! each save rewrites that document as a whole.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;
use vet_chatbot_core::domain::{Conversation, Message, Role};
use vet_chatbot_core::ports::{ConversationStore, PortError, PortResult};

/// Errors raised while reading or rewriting the conversations file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on the conversations file: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in the conversations file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed conversations file: {0}")]
    Malformed(String),
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A store adapter that implements the `ConversationStore` port over a
/// single JSON file.
///
/// The full store is held in memory in file order; reads never touch the
/// disk and every save serializes the whole store back out. The write
/// lands in a sibling temp file first and is renamed into place, so a
/// crash mid-save leaves the previous file intact.
pub struct JsonFileStore {
    path: PathBuf,
    /// Transcripts in insertion order, mirroring the file's key order.
    conversations: RwLock<Vec<(Uuid, Vec<Message>)>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, loading any existing file.
    ///
    /// A missing file is an empty store. A file that cannot be read or
    /// parsed is an error, which the caller treats as fatal at startup
    /// rather than silently shadowing persisted history.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conversations = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_store(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            path,
            conversations: RwLock::new(conversations),
        })
    }

    /// Serializes the given state and replaces the file in one rename.
    async fn persist(&self, conversations: &[(Uuid, Vec<Message>)]) -> Result<(), StoreError> {
        let mut root = Map::new();
        for (session_id, messages) in conversations {
            let records: Vec<MessageRecord> =
                messages.iter().map(MessageRecord::from_domain).collect();
            root.insert(session_id.to_string(), serde_json::to_value(records)?);
        }
        let json = serde_json::to_string_pretty(&Value::Object(root))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn parse_store(raw: &str) -> Result<Vec<(Uuid, Vec<Message>)>, StoreError> {
    let root: Map<String, Value> = serde_json::from_str(raw)?;

    let mut conversations = Vec::with_capacity(root.len());
    for (key, value) in root {
        let session_id = key
            .parse::<Uuid>()
            .map_err(|_| StoreError::Malformed(format!("'{}' is not a session id", key)))?;
        let records: Vec<MessageRecord> = serde_json::from_value(value)?;
        let mut messages = Vec::with_capacity(records.len());
        for record in records {
            messages.push(record.to_domain()?);
        }
        conversations.push((session_id, messages));
    }
    Ok(conversations)
}

//=========================================================================================
// "Impure" File Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct MessageRecord {
    role: String,
    content: String,
}

impl MessageRecord {
    fn from_domain(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }

    fn to_domain(self) -> Result<Message, StoreError> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            StoreError::Malformed(format!("'{}' is not a message role", self.role))
        })?;
        Ok(Message {
            role,
            content: self.content,
        })
    }
}

//=========================================================================================
// `ConversationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn transcript(&self, session_id: Uuid) -> PortResult<Vec<Message>> {
        let conversations = self.conversations.read().await;
        conversations
            .iter()
            .find(|(id, _)| *id == session_id)
            .map(|(_, messages)| messages.clone())
            .ok_or_else(|| PortError::NotFound(format!("No conversation for session {}", session_id)))
    }

    async fn conversations(&self) -> PortResult<Vec<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .iter()
            .map(|(session_id, messages)| Conversation {
                session_id: *session_id,
                messages: messages.clone(),
            })
            .collect())
    }

    async fn save_transcript(&self, session_id: Uuid, messages: &[Message]) -> PortResult<()> {
        // The write lock is held across the file rewrite so saves cannot
        // interleave.
        let mut conversations = self.conversations.write().await;
        match conversations.iter_mut().find(|(id, _)| *id == session_id) {
            Some((_, existing)) => *existing = messages.to_vec(),
            None => conversations.push((session_id, messages.to_vec())),
        }
        self.persist(&conversations)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn path_in(dir: &TempDir) -> PathBuf {
        dir.path().join("conversations.json")
    }

    fn short_transcript() -> Vec<Message> {
        vec![
            Message::user("My cat sneezes a lot"),
            Message::assistant("How long has this been going on?"),
        ]
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();
        assert!(store.conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();
        let result = store.transcript(Uuid::new_v4()).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn saved_transcripts_survive_a_reopen() {
        let dir = TempDir::new().unwrap();
        let session_id = Uuid::new_v4();

        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();
        store.save_transcript(session_id, &short_transcript()).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(path_in(&dir)).await.unwrap();
        assert_eq!(reopened.transcript(session_id).await.unwrap(), short_transcript());
    }

    #[tokio::test]
    async fn save_replaces_the_prior_transcript() {
        let dir = TempDir::new().unwrap();
        let session_id = Uuid::new_v4();
        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();

        store.save_transcript(session_id, &short_transcript()).await.unwrap();
        let mut extended = short_transcript();
        extended.push(Message::user("Since Monday"));
        extended.push(Message::assistant("Watch for discharge from the eyes."));
        store.save_transcript(session_id, &extended).await.unwrap();

        assert_eq!(store.transcript(session_id).await.unwrap(), extended);
        assert_eq!(store.conversations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn conversations_keep_insertion_order_across_updates_and_reopen() {
        let dir = TempDir::new().unwrap();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();

        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();
        for id in [first, second, third] {
            store.save_transcript(id, &short_transcript()).await.unwrap();
        }
        // Updating an existing session must not move it to the back.
        store
            .save_transcript(first, &[Message::user("updated")])
            .await
            .unwrap();

        let order: Vec<Uuid> = store
            .conversations()
            .await
            .unwrap()
            .iter()
            .map(|c| c.session_id)
            .collect();
        assert_eq!(order, vec![first, second, third]);

        let reopened = JsonFileStore::open(path_in(&dir)).await.unwrap();
        let reopened_order: Vec<Uuid> = reopened
            .conversations()
            .await
            .unwrap()
            .iter()
            .map(|c| c.session_id)
            .collect();
        assert_eq!(reopened_order, vec![first, second, third]);
    }

    #[tokio::test]
    async fn file_layout_is_a_map_of_role_content_records() {
        let dir = TempDir::new().unwrap();
        let session_id = Uuid::new_v4();
        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();
        store.save_transcript(session_id, &short_transcript()).await.unwrap();

        let raw = std::fs::read_to_string(path_in(&dir)).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        let transcript = &value[session_id.to_string()];
        assert_eq!(transcript[0]["role"], "user");
        assert_eq!(transcript[0]["content"], "My cat sneezes a lot");
        assert_eq!(transcript[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn no_temp_file_is_left_behind_after_a_save() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(path_in(&dir)).await.unwrap();
        store
            .save_transcript(Uuid::new_v4(), &short_transcript())
            .await
            .unwrap();
        assert!(!path_in(&dir).with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn unparseable_file_fails_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(path_in(&dir), "not json at all").unwrap();
        assert!(matches!(
            JsonFileStore::open(path_in(&dir)).await,
            Err(StoreError::Json(_))
        ));
    }

    #[tokio::test]
    async fn non_uuid_key_fails_open() {
        let dir = TempDir::new().unwrap();
        std::fs::write(path_in(&dir), r#"{"not-a-uuid": []}"#).unwrap();
        assert!(matches!(
            JsonFileStore::open(path_in(&dir)).await,
            Err(StoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn unknown_role_fails_open() {
        let dir = TempDir::new().unwrap();
        let raw = format!(
            r#"{{"{}": [{{"role": "moderator", "content": "hi"}}]}}"#,
            Uuid::new_v4()
        );
        std::fs::write(path_in(&dir), raw).unwrap();
        assert!(matches!(
            JsonFileStore::open(path_in(&dir)).await,
            Err(StoreError::Malformed(_))
        ));
    }
}
