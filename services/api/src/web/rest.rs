//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{proxy, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use legal_welfare_core::{
    filter_activities, Activity, ActivityCounts, ActivityFilter, NewAnalyzedDocument,
    NewGeneratedLetter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        proxy::login_proxy_handler,
        list_activities_handler,
        list_documents_handler,
        add_document_handler,
        clear_documents_handler,
        list_letters_handler,
        add_letter_handler,
        clear_letters_handler,
        stats_handler,
        clear_user_cache_handler,
        clear_all_caches_handler,
        health_handler,
    ),
    components(
        schemas(ActivityFeedResponse, ClearAllResponse)
    ),
    tags(
        (name = "Legal Welfare API", description = "Recent activity, document cache and login proxy.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// One of `all`, `chat`, `document`, `letter`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// The recent-activity timeline, already filtered, plus the unfiltered per-kind counts.
#[derive(Serialize, ToSchema)]
pub struct ActivityFeedResponse {
    #[schema(value_type = Vec<Object>)]
    activities: Vec<Activity>,
    #[schema(value_type = Object)]
    counts: ActivityCounts,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearAllResponse {
    removed_keys: usize,
}

/// Pulls `<token>` out of an `Authorization: Bearer <token>` header. The scheme
/// name is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
}

/// Runs a cache call on the blocking pool. A file-backed store rewrites its file
/// while holding a mutex, which must not stall the async workers.
async fn run_blocking<T, F>(call: F) -> Result<T, (StatusCode, String)>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call).await.map_err(|e| {
        error!("Cache task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Cache operation failed".to_string())
    })
}

//=========================================================================================
// Activity Feed
//=========================================================================================

/// List the unified recent-activity timeline for a user.
///
/// Chat conversations are only included when the request carries a bearer
/// token; it is forwarded to the backend's chat history.
#[utoipa::path(
    get,
    path = "/users/{user_id}/activities",
    params(
        ("user_id" = String, Path, description = "The user whose activity to list."),
        ActivityQuery
    ),
    responses(
        (status = 200, description = "Activities, most recent first", body = ActivityFeedResponse),
        (status = 400, description = "Unknown activity type")
    )
)]
pub async fn list_activities_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<ActivityQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let filter = match query.kind.as_deref() {
        Some(kind) => kind.parse::<ActivityFilter>().map_err(|e| {
            warn!("Rejected activity filter: {}", e);
            (StatusCode::BAD_REQUEST, e)
        })?,
        None => ActivityFilter::All,
    };

    let activities = app_state
        .activities
        .get_all_activities(&user_id, bearer_token(&headers))
        .await;
    let counts = ActivityCounts::tally(&activities);

    Ok(Json(ActivityFeedResponse {
        activities: filter_activities(activities, filter),
        counts,
    }))
}

//=========================================================================================
// Analyzed Documents
//=========================================================================================

#[utoipa::path(
    get,
    path = "/users/{user_id}/documents",
    params(("user_id" = String, Path, description = "The owning user.")),
    responses((status = 200, description = "Analyzed documents, most recent first"))
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    let documents = run_blocking(move || cache.analyzed_documents(&user_id)).await?;
    Ok(Json(documents))
}

/// Record a finished bias analysis. The server assigns `id` and `analyzedAt`.
#[utoipa::path(
    post,
    path = "/users/{user_id}/documents",
    params(("user_id" = String, Path, description = "The owning user.")),
    request_body(content_type = "application/json", description = "filename, result and optional sessionId."),
    responses((status = 201, description = "The stored document"))
)]
pub async fn add_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(document): Json<NewAnalyzedDocument>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    let owner = user_id.clone();
    let stored = run_blocking(move || cache.add_analyzed_document(&owner, document)).await?;
    info!("Cached analyzed document {} for user {}", stored.id, user_id);
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}/documents",
    params(("user_id" = String, Path, description = "The owning user.")),
    responses((status = 204, description = "Cleared"))
)]
pub async fn clear_documents_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    run_blocking(move || cache.clear_analyzed_documents(&user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Generated Letters
//=========================================================================================

#[utoipa::path(
    get,
    path = "/users/{user_id}/letters",
    params(("user_id" = String, Path, description = "The owning user.")),
    responses((status = 200, description = "Generated letters, most recent first"))
)]
pub async fn list_letters_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    let letters = run_blocking(move || cache.generated_letters(&user_id)).await?;
    Ok(Json(letters))
}

/// Record a generated letter. The server assigns `id` and `generatedAt`.
#[utoipa::path(
    post,
    path = "/users/{user_id}/letters",
    params(("user_id" = String, Path, description = "The owning user.")),
    request_body(content_type = "application/json", description = "filename, templateName and success."),
    responses((status = 201, description = "The stored letter"))
)]
pub async fn add_letter_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(letter): Json<NewGeneratedLetter>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    let owner = user_id.clone();
    let stored = run_blocking(move || cache.add_generated_letter(&owner, letter)).await?;
    info!("Cached generated letter {} for user {}", stored.id, user_id);
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}/letters",
    params(("user_id" = String, Path, description = "The owning user.")),
    responses((status = 204, description = "Cleared"))
)]
pub async fn clear_letters_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    run_blocking(move || cache.clear_generated_letters(&user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Dashboard and Maintenance
//=========================================================================================

#[utoipa::path(
    get,
    path = "/users/{user_id}/stats",
    params(("user_id" = String, Path, description = "The owning user.")),
    responses((status = 200, description = "totalAnalyzed, totalInclusive, totalFlagged and totalLetters"))
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    let stats = run_blocking(move || cache.document_stats(&user_id)).await?;
    Ok(Json(stats))
}

/// Drop every cached record of one user, e.g. on logout.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/cache",
    params(("user_id" = String, Path, description = "The owning user.")),
    responses((status = 204, description = "Cleared"))
)]
pub async fn clear_user_cache_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    run_blocking(move || cache.clear_user_cache(&user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Drop every user's cached records. Unrelated keys are kept.
#[utoipa::path(
    delete,
    path = "/cache",
    responses((status = 200, description = "Number of keys removed", body = ClearAllResponse))
)]
pub async fn clear_all_caches_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cache = app_state.cache.clone();
    let removed_keys = run_blocking(move || cache.clear_all_user_caches()).await?;
    Ok(Json(ClearAllResponse { removed_keys }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
