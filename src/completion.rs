//! Completion client: one request to the chat-completion endpoint, one
//! shell command back.

use crate::config::{Config, API_KEY_VAR, ENDPOINT_VAR};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::prompt::build_request_body;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Everything that can go wrong while asking for a command.
///
/// The `Display` text is shown to the user verbatim.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{} environment variable is not set", API_KEY_VAR)]
    MissingApiKey,

    #[error("{} environment variable is not set", ENDPOINT_VAR)]
    MissingEndpoint,

    #[error("failed to build JSON body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to make HTTP request: {0}")]
    Transport(String),

    #[error("failed to unmarshal completion response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("no choices returned from completion endpoint: {body}")]
    NoChoices { body: String },

    #[error("failed to unmarshal command: {0}")]
    MalformedCommand(#[source] serde_json::Error),

    #[error("completion endpoint returned an empty command")]
    EmptyCommand,
}

impl CompletionError {
    /// True for errors detected before any network traffic.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::MissingEndpoint)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CommandPayload {
    command: String,
}

/// Trait for anything that turns a prompt pair into a shell command.
#[async_trait]
pub trait CommandCompleter: Send + Sync {
    async fn request_command(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CompletionError>;
}

/// Completion client backed by an [`HttpClient`].
pub struct CompletionClient {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
    endpoint: Option<String>,
}

impl CompletionClient {
    /// Creates a client using reqwest and the resolved configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Creates a client with a custom transport (for testing).
    pub fn with_http_client(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            api_key: config.api_key().map(str::to_string),
            endpoint: config.endpoint().map(str::to_string),
        }
    }
}

#[async_trait]
impl CommandCompleter for CompletionClient {
    async fn request_command(&self, system_prompt: &str, user_prompt: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;
        let endpoint = self.endpoint.as_deref().ok_or(CompletionError::MissingEndpoint)?;

        let body = build_request_body(system_prompt, user_prompt).map_err(CompletionError::Encode)?;

        info!("Requesting command from {}", endpoint);
        let response_text = self
            .http
            .post_json(endpoint, &[("api-key", api_key)], body)
            .await
            .map_err(|e| CompletionError::Transport(format!("{:#}", e)))?;
        debug!("Completion response: {}", response_text);

        let command = parse_command(&response_text)?;
        info!("Received command: {}", command);
        Ok(command)
    }
}

/// Extracts the command from a raw completion response.
///
/// The first choice's message content must itself be a JSON object with a
/// `command` field.
pub fn parse_command(response_text: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse =
        serde_json::from_str(response_text).map_err(CompletionError::MalformedResponse)?;

    let Some(first) = response.choices.into_iter().next() else {
        warn!("Completion response had no choices");
        return Err(CompletionError::NoChoices {
            body: response_text.to_string(),
        });
    };

    let payload: CommandPayload =
        serde_json::from_str(&first.message.content).map_err(CompletionError::MalformedCommand)?;

    if payload.command.is_empty() {
        return Err(CompletionError::EmptyCommand);
    }
    Ok(payload.command)
}
