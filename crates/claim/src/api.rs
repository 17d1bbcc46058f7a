//! HTTP API for the claim relay

use super::error::ClaimError;
use super::request::ClaimBody;
use super::service::ClaimService;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Body of every claim response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub ok: bool,
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClaimResponse {
    pub fn success(tx_hash: String) -> Self {
        Self {
            ok: true,
            tx_hash: Some(tx_hash),
            error: None,
        }
    }
}

/// Build the relay router
pub fn router(service: Arc<ClaimService>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/claim", any(claim_handler))
        .route("/api/claim", any(claim_handler))
        .with_state(service)
}

/// Claim handler
///
/// Accepts every method so that the method check answers with the JSON 405
/// body instead of the router's empty one.
pub async fn claim_handler(
    State(service): State<Arc<ClaimService>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match handle_claim(&service, &method, &headers, &body).await {
        Ok(tx_hash) => (StatusCode::OK, Json(ClaimResponse::success(tx_hash))).into_response(),
        Err(e) => {
            if e.is_client_error() {
                warn!("Claim rejected ({} {}): {}", method, e.status_code(), e);
            } else {
                error!("Claim failed: {:?}", e);
            }
            e.into_response()
        }
    }
}

async fn handle_claim(
    service: &ClaimService,
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<String, ClaimError> {
    if method != Method::POST {
        return Err(ClaimError::MethodNotAllowed);
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !service.authorize(authorization) {
        return Err(ClaimError::Unauthorized);
    }

    let fields = ClaimBody::decode(body).fields();
    debug!(bytes = body.len(), "Claim request received");

    service.claim(&fields).await
}

/// Status handler
pub async fn status_handler(State(service): State<Arc<ClaimService>>) -> impl IntoResponse {
    Json(service.get_status())
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Root handler with info
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Drop Claim Relay",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Relays claimTo calls to a token drop contract",
        "endpoints": {
            "POST /claim": "Claim tokens for a recipient",
            "POST /api/claim": "Alias of /claim",
            "GET /api/status": "Relay configuration summary",
            "GET /health": "Health check"
        }
    }))
}
