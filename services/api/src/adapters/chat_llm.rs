//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the hosted chat-completion
//! endpoint. It implements the `ChatCompletionService` port from the
//! `core` crate over the OpenAI chat completions API.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use vet_chatbot_core::domain::{Message, Role};
use vet_chatbot_core::ports::{ChatCompletionService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatCompletionService` against an
/// OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter` speaking for `model`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Maps one domain message onto the wire representation, keeping its role.
fn to_wire(message: &Message) -> PortResult<ChatCompletionRequestMessage> {
    let wire = match message.role {
        Role::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ),
        Role::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ),
        Role::Assistant => ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ),
    };
    Ok(wire)
}

//=========================================================================================
// `ChatCompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatCompletionService for OpenAiChatAdapter {
    /// Sends the assembled message list as-is and returns the first
    /// choice's content. One request per turn, no retry, no streaming.
    async fn complete(&self, messages: &[Message]) -> PortResult<String> {
        let wire_messages = messages
            .iter()
            .map(to_wire)
            .collect::<PortResult<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(wire_messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| PortError::Unexpected("The completion had no content".to_string()))?;

        Ok(content)
    }
}
