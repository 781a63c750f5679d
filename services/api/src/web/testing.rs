//! services/api/src/web/testing.rs
//!
//! Test-only stub ports and state builders shared by the web-layer tests.

use crate::config::Config;
use crate::web::state::AppState;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use vet_chatbot_core::domain::{Conversation, Message};
use vet_chatbot_core::ports::{ChatCompletionService, ConversationStore, PortError, PortResult};

/// A scripted completion service that records every request it receives.
pub(crate) struct StubChat {
    reply: String,
    fail: bool,
    pub(crate) requests: Mutex<Vec<Vec<Message>>>,
}

impl StubChat {
    pub(crate) fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: String::new(),
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatCompletionService for StubChat {
    async fn complete(&self, messages: &[Message]) -> PortResult<String> {
        self.requests.lock().await.push(messages.to_vec());
        if self.fail {
            Err(PortError::Unexpected("completion endpoint down".to_string()))
        } else {
            Ok(self.reply.clone())
        }
    }
}

/// An in-memory store mirroring the JSON file store's upsert and ordering
/// behavior.
#[derive(Default)]
pub(crate) struct StubStore {
    pub(crate) conversations: Mutex<Vec<(Uuid, Vec<Message>)>>,
    pub(crate) save_count: AtomicUsize,
    fail_saves: bool,
}

impl StubStore {
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_saves: true,
            ..Self::default()
        })
    }

    /// Preloads a persisted conversation, as if read from disk at startup.
    pub(crate) async fn seed(&self, session_id: Uuid, messages: Vec<Message>) {
        self.conversations.lock().await.push((session_id, messages));
    }
}

#[async_trait]
impl ConversationStore for StubStore {
    async fn transcript(&self, session_id: Uuid) -> PortResult<Vec<Message>> {
        self.conversations
            .lock()
            .await
            .iter()
            .find(|(id, _)| *id == session_id)
            .map(|(_, messages)| messages.clone())
            .ok_or_else(|| PortError::NotFound(format!("No conversation for session {}", session_id)))
    }

    async fn conversations(&self) -> PortResult<Vec<Conversation>> {
        Ok(self
            .conversations
            .lock()
            .await
            .iter()
            .map(|(session_id, messages)| Conversation {
                session_id: *session_id,
                messages: messages.clone(),
            })
            .collect())
    }

    async fn save_transcript(&self, session_id: Uuid, messages: &[Message]) -> PortResult<()> {
        if self.fail_saves {
            return Err(PortError::Unexpected("store write failed".to_string()));
        }
        let mut conversations = self.conversations.lock().await;
        match conversations.iter_mut().find(|(id, _)| *id == session_id) {
            Some((_, existing)) => *existing = messages.to_vec(),
            None => conversations.push((session_id, messages.to_vec())),
        }
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn test_config(history_turns: Option<usize>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        conversations_path: PathBuf::from("unused.json"),
        log_level: tracing::Level::INFO,
        openai_api_key: "test-key".to_string(),
        openai_api_base: None,
        chat_model: "gpt-4o-mini".to_string(),
        history_turns,
        ui_origin: "http://localhost:3000".to_string(),
    }
}

pub(crate) fn app_with(
    chat: Arc<dyn ChatCompletionService>,
    store: Arc<dyn ConversationStore>,
    history_turns: Option<usize>,
) -> Arc<AppState> {
    Arc::new(AppState::new(store, chat, Arc::new(test_config(history_turns))))
}
