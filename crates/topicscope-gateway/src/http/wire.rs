// Request and response bodies exactly as the backend speaks them

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct UrlRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RetrainRequest<'a> {
    pub urls: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveContentResponse {
    pub filename: String,
}

/// `{success, message}` envelope used by retrain and delete
#[derive(Debug, Deserialize)]
pub(crate) struct Acknowledgement {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl Acknowledgement {
    pub fn into_message(self) -> Result<String> {
        if self.success {
            Ok(self.message)
        } else if self.message.is_empty() {
            Err(GatewayError::server("request was not accepted"))
        } else {
            Err(GatewayError::server(self.message))
        }
    }
}

/// Pull the human-readable detail out of an error body.
///
/// The backend answers failures with `{"error": ...}` or
/// `{"success": false, "message": ...}`; anything else is passed through raw.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["error", "message", "detail"] {
            if let Some(serde_json::Value::String(detail)) = map.get(key) {
                return Some(detail.clone());
            }
        }
    }

    Some(trimmed.to_string())
}
