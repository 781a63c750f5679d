//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JsonFileStore, OpenAiChatAdapter},
    config::Config,
    error::ApiError,
    web::{api_router, state::AppState, ApiDoc},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Conversation Store ---
    info!(
        "Opening conversation store at {}",
        config.conversations_path.display()
    );
    let store = Arc::new(JsonFileStore::open(&config.conversations_path).await?);

    // --- 3. Initialize the Completion Adapter ---
    let mut openai_config = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());
    if let Some(api_base) = &config.openai_api_base {
        openai_config = openai_config.with_api_base(api_base);
    }
    let openai_client = Client::with_config(openai_config);
    let chat_adapter = Arc::new(OpenAiChatAdapter::new(
        openai_client,
        config.chat_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, chat_adapter, config.clone()));

    // --- 5. Configure CORS for the Browser Client ---
    let ui_origin = config
        .ui_origin
        .parse::<HeaderValue>()
        .map_err(|_| ApiError::Internal(format!("Invalid UI_ORIGIN '{}'", config.ui_origin)))?;
    let cors = CorsLayer::new()
        .allow_origin(ui_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    // Uploads are not size-limited; extraction handles whatever arrives.
    let rest_router = api_router()
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(rest_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
