//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::extract::extract_text;
use crate::web::chat_turn::{run_chat_turn, ChatTurnError};
use crate::web::state::{AppState, SessionState};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;
use vet_chatbot_core::domain::Message;
use vet_chatbot_core::ports::PortError;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        list_sessions_handler,
        get_session_handler,
        post_message_handler,
        upload_document_handler,
        set_context_visibility_handler,
    ),
    components(
        schemas(
            CreateSessionResponse,
            SessionSummary,
            SessionDetail,
            MessageDto,
            ChatMessageRequest,
            ChatMessageResponse,
            UploadDocumentResponse,
            ContextVisibilityResponse,
        )
    ),
    tags(
        (name = "Vet Chatbot API", description = "API endpoints for the pet health assistant.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// All REST routes. The binary layers CORS, the body limit, and the state
/// on top of this.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index_handler))
        .route(
            "/sessions",
            post(create_session_handler).get(list_sessions_handler),
        )
        .route("/sessions/{id}", get(get_session_handler))
        .route("/sessions/{id}/messages", post(post_message_handler))
        .route("/sessions/{id}/document", post(upload_document_handler))
        .route(
            "/sessions/{id}/context/visibility",
            post(set_context_visibility_handler),
        )
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after starting a new conversation.
#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    session_id: Uuid,
}

/// One sidebar entry: a stored conversation and its display title.
#[derive(Serialize, ToSchema)]
pub struct SessionSummary {
    session_id: Uuid,
    title: String,
}

/// A full conversation as the client renders it.
#[derive(Serialize, ToSchema)]
pub struct SessionDetail {
    session_id: Uuid,
    messages: Vec<MessageDto>,
    show_document: bool,
    /// The document text, present only while the toggle is on and the
    /// session actually has context.
    document_context: Option<String>,
}

impl SessionDetail {
    fn from_session(session_id: Uuid, session: &SessionState) -> Self {
        Self {
            session_id,
            messages: session.messages.iter().map(MessageDto::from_domain).collect(),
            show_document: session.show_document,
            document_context: visible_context(session),
        }
    }
}

/// One transcript turn on the wire.
#[derive(Serialize, ToSchema)]
pub struct MessageDto {
    role: String,
    content: String,
}

impl MessageDto {
    fn from_domain(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// The user's message for one chat turn.
#[derive(Deserialize, ToSchema)]
pub struct ChatMessageRequest {
    content: String,
}

/// The assistant's reply for one chat turn.
#[derive(Serialize, ToSchema)]
pub struct ChatMessageResponse {
    reply: String,
}

/// The outcome of a document upload.
#[derive(Serialize, ToSchema)]
pub struct UploadDocumentResponse {
    /// False when the declared media type is not one we extract; the
    /// session context then holds the unsupported-format notice.
    supported: bool,
    context_chars: usize,
}

/// The state of the document-context toggle after flipping it.
#[derive(Serialize, ToSchema)]
pub struct ContextVisibilityResponse {
    show_document: bool,
    document_context: Option<String>,
}

fn visible_context(session: &SessionState) -> Option<String> {
    if session.show_document && !session.document_context.is_empty() {
        Some(session.document_context.clone())
    } else {
        None
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Serves the embedded single-page chat UI.
pub async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

/// Start a new conversation.
///
/// Returns a fresh session id with an empty transcript, no document
/// context, and a hidden toggle. Prior conversations stay selectable.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Conversation created", body = CreateSessionResponse)
    )
)]
pub async fn create_session_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = Uuid::new_v4();
    app_state
        .sessions
        .write()
        .await
        .insert(session_id, SessionState::default());
    info!("Started new conversation {}", session_id);
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// List every stored conversation for the sidebar, oldest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Stored conversations", body = [SessionSummary]),
        (status = 500, description = "The store could not be read")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.store.conversations().await {
        Ok(conversations) => {
            let sessions: Vec<SessionSummary> = conversations
                .iter()
                .filter(|c| !c.messages.is_empty())
                .map(|c| SessionSummary {
                    session_id: c.session_id,
                    title: c.title(),
                })
                .collect();
            Ok(Json(sessions))
        }
        Err(e) => {
            error!("Failed to list conversations: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list conversations".to_string(),
            ))
        }
    }
}

/// Select a conversation: its transcript and context visibility.
///
/// A session that is not live is rehydrated from the store with empty
/// ephemeral state. Ids in neither the registry nor the store are 404.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "The conversation", body = SessionDetail),
        (status = 404, description = "No such conversation")
    ),
    params(
        ("id" = Uuid, Path, description = "The session identifier.")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    {
        let sessions = app_state.sessions.read().await;
        if let Some(session) = sessions.get(&session_id) {
            return Ok(Json(SessionDetail::from_session(session_id, session)));
        }
    }

    match app_state.store.transcript(session_id).await {
        Ok(messages) => {
            let mut sessions = app_state.sessions.write().await;
            let session = sessions
                .entry(session_id)
                .or_insert_with(|| SessionState::from_transcript(messages));
            Ok(Json(SessionDetail::from_session(session_id, session)))
        }
        Err(PortError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            format!("No conversation for session {}", session_id),
        )),
        Err(e) => {
            error!("Failed to load session {}: {:?}", session_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load the conversation".to_string(),
            ))
        }
    }
}

/// Run one chat turn.
///
/// Sends the session's history, the new input, and any document context to
/// the completion service, then appends the finished turn and persists it.
#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "The assistant replied", body = ChatMessageResponse),
        (status = 400, description = "Blank message content"),
        (status = 502, description = "The completion service failed"),
        (status = 500, description = "The turn could not be persisted")
    ),
    params(
        ("id" = Uuid, Path, description = "The session identifier.")
    )
)]
pub async fn post_message_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<ChatMessageRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Message content must not be empty".to_string(),
        ));
    }

    match run_chat_turn(app_state, session_id, &payload.content).await {
        Ok(reply) => Ok(Json(ChatMessageResponse { reply })),
        Err(ChatTurnError::Completion(e)) => {
            error!("Completion failed for session {}: {:?}", session_id, e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
        Err(ChatTurnError::Persistence(e)) => {
            error!("Failed to persist session {}: {:?}", session_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist the conversation".to_string(),
            ))
        }
    }
}

/// Upload a document for the session's context.
///
/// Accepts a multipart/form-data request with a single file part. The
/// extracted text silently replaces any prior context. A declared media
/// type outside pdf/docx/plain-text is not an error: the context becomes
/// the unsupported-format notice instead.
#[utoipa::path(
    post,
    path = "/sessions/{id}/document",
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 200, description = "Context updated", body = UploadDocumentResponse),
        (status = 400, description = "The file bytes could not be extracted"),
        (status = 500, description = "The upload could not be read")
    ),
    params(
        ("id" = Uuid, Path, description = "The session identifier.")
    )
)]
pub async fn upload_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (media_type, data) = if let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let media_type = field.content_type().unwrap_or("").to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        (media_type, data)
    } else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include a file".to_string(),
        ));
    };

    let extracted = extract_text(&media_type, &data).map_err(|e| {
        error!("Extraction failed for session {}: {}", session_id, e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    app_state.materialize_session(session_id).await.map_err(|e| {
        error!("Failed to load session {}: {:?}", session_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load the conversation".to_string(),
        )
    })?;

    let supported = extracted.is_supported();
    let context = extracted.into_context();
    let context_chars = context.chars().count();
    info!(
        "Session {} document context set ({} chars, supported: {})",
        session_id, context_chars, supported
    );

    {
        let mut sessions = app_state.sessions.write().await;
        let session = sessions.entry(session_id).or_default();
        session.document_context = context;
    }

    Ok(Json(UploadDocumentResponse {
        supported,
        context_chars,
    }))
}

/// Flip the show/hide toggle for the session's document context.
#[utoipa::path(
    post,
    path = "/sessions/{id}/context/visibility",
    responses(
        (status = 200, description = "The toggle state", body = ContextVisibilityResponse),
        (status = 500, description = "The session could not be loaded")
    ),
    params(
        ("id" = Uuid, Path, description = "The session identifier.")
    )
)]
pub async fn set_context_visibility_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.materialize_session(session_id).await.map_err(|e| {
        error!("Failed to load session {}: {:?}", session_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load the conversation".to_string(),
        )
    })?;

    let mut sessions = app_state.sessions.write().await;
    let session = sessions.entry(session_id).or_default();
    session.show_document = !session.show_document;
    Ok(Json(ContextVisibilityResponse {
        show_document: session.show_document,
        document_context: visible_context(session),
    }))
}
