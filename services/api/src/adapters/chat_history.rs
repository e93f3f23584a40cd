//! services/api/src/adapters/chat_history.rs
//!
//! This module contains the adapter for the backend's chat-history endpoint.
//! It implements the `ChatHistoryService` port from the `core` crate.

use std::time::Duration;

use async_trait::async_trait;
use legal_welfare_core::domain::ConversationSummary;
use legal_welfare_core::ports::{ChatHistoryService, PortError, PortResult};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

const CONVERSATIONS_PATH: &str = "/api/v1/chat-history/conversations";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ChatHistoryService` port over HTTP.
#[derive(Clone)]
pub struct HttpChatHistoryAdapter {
    client: Client,
    backend_url: String,
    timeout: Duration,
}

impl HttpChatHistoryAdapter {
    /// Creates a new `HttpChatHistoryAdapter`.
    pub fn new(client: Client, backend_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

//=========================================================================================
// `ChatHistoryService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatHistoryService for HttpChatHistoryAdapter {
    async fn list_conversations(&self, token: &str) -> PortResult<Vec<ConversationSummary>> {
        let url = format!("{}{}", self.backend_url, CONVERSATIONS_PATH);

        let response = self
            .client
            .get(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("chat history request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PortError::Unauthorized);
        }
        if !status.is_success() {
            return Err(PortError::Unexpected(format!(
                "chat history returned HTTP {}",
                status.as_u16()
            )));
        }

        let items: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed chat history: {}", e)))?;
        let total = items.len();

        // One bad entry must not hide the rest of the history.
        let conversations: Vec<ConversationSummary> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(conversation) => Some(conversation),
                Err(e) => {
                    warn!("Skipping malformed conversation entry: {}", e);
                    None
                }
            })
            .collect();
        debug!("Fetched {} of {} conversations", conversations.len(), total);
        Ok(conversations)
    }
}
