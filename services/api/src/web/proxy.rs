//! services/api/src/web/proxy.rs
//!
//! Login proxy: forwards the browser's credentials to the backend and relays its
//! answer. Nothing about the failure is leaked to the caller.

use crate::{error::ApiError, web::state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// POST /api/login - Relay a login request to the backend
#[utoipa::path(
    post,
    path = "/api/login",
    request_body(content_type = "application/json", description = "Credentials, forwarded verbatim."),
    responses(
        (status = 200, description = "Backend status and JSON body, relayed as-is"),
        (status = 500, description = "The proxy could not reach the backend")
    )
)]
pub async fn login_proxy_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match forward_login(&state, &body).await {
        Ok((status, data)) => (status, Json(data)).into_response(),
        Err(e) => {
            error!("/api/login proxy error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Proxy failed" })),
            )
                .into_response()
        }
    }
}

async fn forward_login(state: &AppState, body: &[u8]) -> Result<(StatusCode, Value), ApiError> {
    let payload: Value = serde_json::from_slice(body)?;

    let backend_res = state
        .http
        .post(format!("{}/login", state.config.backend_url))
        .json(&payload)
        .send()
        .await?;

    let status = StatusCode::from_u16(backend_res.status().as_u16())
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    debug!("Backend answered login with HTTP {}", status.as_u16());

    let data = backend_res
        .json::<Value>()
        .await
        .ok()
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| json!({ "message": "No JSON response from backend" }));

    Ok((status, data))
}

#[cfg(test)]
mod tests {
    use crate::web::test_support::{send, test_state};
    use axum::{body::Body, http::Request, http::StatusCode};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn login_request(body: &str) -> Request<Body> {
        Request::post("/api/login")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn relays_backend_status_and_body() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({ "username": "ana", "password": "pw" })))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Bad credentials" })))
            .expect(1)
            .mount(&backend)
            .await;

        let (state, _) = test_state(&backend.uri());
        let (status, body) = send(state, login_request(r#"{"username":"ana","password":"pw"}"#)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "detail": "Bad credentials" }));
    }

    #[tokio::test]
    async fn non_json_backend_body_gets_placeholder() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&backend)
            .await;

        let (state, _) = test_state(&backend.uri());
        let (status, body) = send(state, login_request(r#"{"username":"ana"}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "message": "No JSON response from backend" }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_proxy_failed() {
        // Nothing listens on port 9 on the test host.
        let (state, _) = test_state("http://127.0.0.1:9");
        let (status, body) = send(state, login_request(r#"{"username":"ana"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Proxy failed" }));
    }

    #[tokio::test]
    async fn invalid_request_json_is_proxy_failed() {
        let (state, _) = test_state("http://127.0.0.1:9");
        let (status, body) = send(state, login_request("{oops")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Proxy failed" }));
    }
}
