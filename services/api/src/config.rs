//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub conversations_path: PathBuf,
    pub log_level: Level,
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub chat_model: String,
    /// Cap on the user/assistant turn pairs forwarded per completion
    /// request. Unset forwards the whole history.
    pub history_turns: Option<usize>,
    pub ui_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Store Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let conversations_path = std::env::var("CONVERSATIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./conversations.json"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Completion Service Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
        let openai_api_base = std::env::var("OPENAI_API_BASE").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let history_turns = match std::env::var("HISTORY_TURNS") {
            Ok(raw) => Some(raw.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(
                    "HISTORY_TURNS".to_string(),
                    format!("'{}' is not a number of turns", raw),
                )
            })?),
            Err(_) => None,
        };

        let ui_origin = std::env::var("UI_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            conversations_path,
            log_level,
            openai_api_key,
            openai_api_base,
            chat_model,
            history_turns,
            ui_origin,
        })
    }
}
