//! crates/legal_welfare_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the concrete key-value store and of the chat backend.

use async_trait::async_trait;

use crate::domain::ConversationSummary;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., filesystem, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A flat, string-keyed persistent store, the server-side stand-in for browser
/// local storage. Calls are synchronous and never suspend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Overwrites the whole value stored under `key`.
    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> PortResult<()>;

    /// Lists every key currently held by the store.
    fn keys(&self) -> PortResult<Vec<String>>;
}

#[async_trait]
pub trait ChatHistoryService: Send + Sync {
    /// Lists the conversations visible to the holder of `token`.
    async fn list_conversations(&self, token: &str) -> PortResult<Vec<ConversationSummary>>;
}
