//! Error types for the claim relay

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Claim relay errors
///
/// Everything except `Execution` is detected before any network call is made.
/// An `Execution` error may happen after the transaction was broadcast, in
/// which case its on-chain outcome is unknown to the relay.
#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid quantity")]
    InvalidQuantity,

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Execution(String),
}

impl ClaimError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClaimError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ClaimError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClaimError::InvalidAddress | ClaimError::InvalidQuantity => StatusCode::BAD_REQUEST,
            ClaimError::Config(_) | ClaimError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `error` field of the response body
    pub fn public_message(&self) -> String {
        match self {
            ClaimError::Execution(msg) if msg.trim().is_empty() => "fail".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure is the caller's fault rather than the relay's
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<k256::ecdsa::Error> for ClaimError {
    fn from(err: k256::ecdsa::Error) -> Self {
        ClaimError::Execution(format!("signing failed: {}", err))
    }
}

impl From<ethabi::Error> for ClaimError {
    fn from(err: ethabi::Error) -> Self {
        ClaimError::Execution(format!("abi encoding failed: {}", err))
    }
}

impl IntoResponse for ClaimError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "ok": false,
            "error": self.public_message(),
        }));

        let mut response = (status, body).into_response();
        if let ClaimError::MethodNotAllowed = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

pub type ClaimResult<T> = Result<T, ClaimError>;
