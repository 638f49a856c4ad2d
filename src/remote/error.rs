//! Errors decoded once at the network boundary.

use reqwest::StatusCode;
use thiserror::Error;
use crate::ErrorKind;

/// Backend or transport failure with a message fit for display.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl ApiError {
    pub const FALLBACK_MESSAGE: &'static str = "Something went wrong. Please try again.";

    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), status: None }
    }

    /// Classifies a non-2xx response, passing the backend's message through when it sent one.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let payload: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
        let message = extract_message(&payload);
        let kind = match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Validation,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Auth { expired: status == StatusCode::UNAUTHORIZED && is_expiry(&payload, message.as_deref()) },
            s if s.is_server_error() => ErrorKind::Network,
            _ => ErrorKind::Unknown,
        };
        Self { kind, message: message.unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_string()), status: Some(status.as_u16()) }
    }

    pub fn kind(&self) -> ErrorKind { self.kind }
    pub fn message(&self) -> &str { &self.message }
    pub fn status(&self) -> Option<u16> { self.status }
    pub fn is_session_expired(&self) -> bool { self.kind == ErrorKind::Auth { expired: true } }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self { kind: ErrorKind::Unknown, message: format!("Unexpected response from server: {}", e), status: None };
        }
        if let Some(status) = e.status() {
            return Self::from_response(status, "");
        }
        Self { kind: ErrorKind::Network, message: Self::FALLBACK_MESSAGE.to_string(), status: None }
    }
}

fn extract_message(payload: &serde_json::Value) -> Option<String> {
    ["/message", "/error/message", "/error", "/data/message"]
        .iter()
        .filter_map(|pointer| payload.pointer(pointer).and_then(|v| v.as_str()))
        .find(|m| !m.trim().is_empty())
        .map(str::to_string)
}

fn is_expiry(payload: &serde_json::Value, message: Option<&str>) -> bool {
    let code_expired = ["/code", "/error/code"]
        .iter()
        .filter_map(|pointer| payload.pointer(pointer).and_then(|v| v.as_str()))
        .any(|code| code.eq_ignore_ascii_case("token_expired"));
    code_expired || message.is_some_and(|m| m.to_ascii_lowercase().contains("expired"))
}
