//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::{adapters::HttpChatHistoryAdapter, config::Config, error::ApiError};
use legal_welfare_core::{
    ActivityAggregator, ChatHistoryService, DocumentCache, KeyValueStore, KeyedStore,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Outbound client for the legal-welfare backend.
    pub http: reqwest::Client,
    pub cache: DocumentCache,
    pub activities: ActivityAggregator,
}

impl AppState {
    /// Wires the cache and the activity aggregator on top of `store`.
    pub fn new(config: Arc<Config>, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;

        let cache = DocumentCache::with_capacity(KeyedStore::new(store), config.cache_max_items);
        let chat_history: Arc<dyn ChatHistoryService> = Arc::new(HttpChatHistoryAdapter::new(
            http.clone(),
            config.backend_url.clone(),
            config.chat_history_timeout,
        ));
        let activities = ActivityAggregator::new(cache.clone(), Some(chat_history));

        Ok(Self {
            config,
            http,
            cache,
            activities,
        })
    }
}
