pub mod proxy;
pub mod rest;
pub mod state;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub use proxy::login_proxy_handler;
pub use rest::{
    add_document_handler, add_letter_handler, clear_all_caches_handler, clear_documents_handler,
    clear_letters_handler, clear_user_cache_handler, health_handler, list_activities_handler,
    list_documents_handler, list_letters_handler, stats_handler,
};
use state::AppState;

/// Builds every API route. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/login", post(login_proxy_handler))
        .route("/users/{user_id}/activities", get(list_activities_handler))
        .route(
            "/users/{user_id}/documents",
            get(list_documents_handler)
                .post(add_document_handler)
                .delete(clear_documents_handler),
        )
        .route(
            "/users/{user_id}/letters",
            get(list_letters_handler)
                .post(add_letter_handler)
                .delete(clear_letters_handler),
        )
        .route("/users/{user_id}/stats", get(stats_handler))
        .route("/users/{user_id}/cache", delete(clear_user_cache_handler))
        .route("/cache", delete(clear_all_caches_handler))
        .with_state(app_state)
}
