//! crates/vet_chatbot_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete completion service and store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Conversation, Message};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., the
/// completion endpoint or the store file).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The hosted language-model endpoint that produces assistant replies.
///
/// One synchronous request per user turn; the full assembled message list
/// goes out and a single completion text comes back. No retry, no streaming.
#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> PortResult<String>;
}

/// The durable conversation store: session identifier -> ordered transcript.
///
/// Implementations must guarantee that a failed save leaves previously
/// persisted transcripts readable; a crash mid-turn may lose the in-flight
/// turn but never prior history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the transcript persisted for a session, or `NotFound`.
    async fn transcript(&self, session_id: Uuid) -> PortResult<Vec<Message>>;

    /// Every persisted conversation, oldest first.
    async fn conversations(&self) -> PortResult<Vec<Conversation>>;

    /// Replaces the stored transcript for one session and rewrites the
    /// store as a whole.
    async fn save_transcript(&self, session_id: Uuid, messages: &[Message]) -> PortResult<()>;
}
