//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vet_chatbot_core::domain::Message;
use vet_chatbot_core::ports::{ChatCompletionService, ConversationStore, PortError, PortResult};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub chat_adapter: Arc<dyn ChatCompletionService>,
    pub config: Arc<Config>,
    /// Live sessions keyed by session id. Sessions materialize on first
    /// touch and live for the life of the process.
    pub sessions: RwLock<HashMap<Uuid, SessionState>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        chat_adapter: Arc<dyn ChatCompletionService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            chat_adapter,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Ensures a live session exists for `session_id`.
    ///
    /// An id that is not live but has a persisted transcript (the normal
    /// case after a process restart) is rehydrated from the store with
    /// empty ephemeral state. Ids in neither place start fresh. The
    /// registry lock is held across the store read so concurrent
    /// materializations of one session cannot clobber each other.
    pub async fn materialize_session(&self, session_id: Uuid) -> PortResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Ok(());
        }
        let messages = match self.store.transcript(session_id).await {
            Ok(messages) => messages,
            Err(PortError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        sessions.insert(session_id, SessionState::from_transcript(messages));
        Ok(())
    }
}

//=========================================================================================
// SessionState (Specific to One Conversation)
//=========================================================================================

/// The state of a single live conversation.
///
/// `document_context` and `show_document` are ephemeral: they exist only in
/// this process. Only `messages` ever reaches the durable store.
#[derive(Default)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub document_context: String,
    pub show_document: bool,
}

impl SessionState {
    /// Rehydrates a session from a persisted transcript. The ephemeral
    /// fields start empty, exactly like a fresh session.
    pub fn from_transcript(messages: Vec<Message>) -> Self {
        Self {
            messages,
            document_context: String::new(),
            show_document: false,
        }
    }

    /// Appends one completed user/assistant turn.
    pub fn push_turn(&mut self, user_input: &str, assistant_reply: &str) {
        self.messages.push(Message::user(user_input));
        self.messages.push(Message::assistant(assistant_reply));
    }
}
