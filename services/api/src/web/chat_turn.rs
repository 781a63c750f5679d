//! services/api/src/web/chat_turn.rs
//!
//! This module contains the worker function for a single chat turn. It
//! snapshots the session, assembles the outgoing message list, calls the
//! completion port, and commits the finished turn to the live session and
//! the durable store.

use crate::web::state::AppState;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use vet_chatbot_core::ports::PortError;
use vet_chatbot_core::prompt::assemble_request;

/// How a chat turn failed. The handler maps the two causes to different
/// status codes.
#[derive(Debug, thiserror::Error)]
pub enum ChatTurnError {
    #[error("Completion request failed: {0}")]
    Completion(#[source] PortError),
    #[error("Failed to persist the conversation: {0}")]
    Persistence(#[source] PortError),
}

/// Runs one full chat turn for a session and returns the assistant reply.
///
/// A session that is stored but not live is rehydrated first, so a turn
/// after a restart extends the persisted history. Nothing is appended
/// until the completion succeeds, so a completion fault leaves the
/// transcript untouched in both the live session and the store. The raw
/// user input is what gets appended; the document context rides only on
/// the outgoing request.
pub async fn run_chat_turn(
    app_state: Arc<AppState>,
    session_id: Uuid,
    input: &str,
) -> Result<String, ChatTurnError> {
    app_state
        .materialize_session(session_id)
        .await
        .map_err(ChatTurnError::Persistence)?;

    // Snapshot the history and context. The lock is not held across the
    // completion call.
    let (history, context) = {
        let mut sessions = app_state.sessions.write().await;
        let session = sessions.entry(session_id).or_default();
        (session.messages.clone(), session.document_context.clone())
    };

    let request = assemble_request(&history, input, &context, app_state.config.history_turns);
    info!(
        "Requesting completion for session {} with {} outgoing messages.",
        session_id,
        request.len()
    );

    let reply = app_state
        .chat_adapter
        .complete(&request)
        .await
        .map_err(ChatTurnError::Completion)?;

    let transcript = {
        let mut sessions = app_state.sessions.write().await;
        let session = sessions.entry(session_id).or_default();
        session.push_turn(input, &reply);
        session.messages.clone()
    };

    app_state
        .store
        .save_transcript(session_id, &transcript)
        .await
        .map_err(ChatTurnError::Persistence)?;

    Ok(reply)
}
