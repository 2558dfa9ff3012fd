// HTTP implementation of the backend gateway

use super::wire::{extract_detail, Acknowledgement, RetrainRequest, SaveContentResponse, UrlRequest};
use crate::config::DEFAULT_BASE_URL;
use crate::error::{GatewayError, Result};
use crate::traits::{Backend, BatchResponse, RetrainOutcome, SavedContent};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use topicscope_types::{
    AnalyticsSummary, HistoryEntry, Identity, PredictionResult, UploadFile,
};
use url::Url;

/// Backend gateway over HTTP+JSON.
///
/// This is the single place where transport failures and status codes are
/// translated into [`GatewayError`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn builder() -> HttpBackendBuilder {
        HttpBackendBuilder::default()
    }

    /// Create a client for `base_url` with transport-default timeouts
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                GatewayError::unknown(format!("base URL {} cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send a request and reject non-success statuses
    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_transport(&e, operation))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("{} succeeded: {}", operation, status);
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("{} error body could not be read: {}", operation, e);
                String::new()
            }
        };
        tracing::debug!("{} failed: status={}, body={}", operation, status, body);
        Err(classify_status(status, &body))
    }

    async fn read_json<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        let body = response.text().await.map_err(|e| {
            GatewayError::network(format!("{} response was interrupted: {}", operation, e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::unknown(format!(
                "could not decode {} response: {} (body: {})",
                operation, e, body
            ))
        })
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(&["download_content", filename])?;
        let response = self
            .send(self.http_client.get(url), "download_content")
            .await?;

        let bytes = response.bytes().await.map_err(|e| {
            GatewayError::network(format!("download of {} was interrupted: {}", filename, e))
        })?;
        Ok(bytes.to_vec())
    }
}

// ============================================================================
// TRAIT IMPLEMENTATION
// ============================================================================

#[async_trait]
impl Backend for HttpBackend {
    async fn predict(&self, url: &str, identity: Option<&Identity>) -> Result<PredictionResult> {
        let payload = UrlRequest {
            url,
            user_id: identity.map(Identity::as_str),
        };

        let response = self
            .send(
                self.http_client.post(self.endpoint(&["predict"])?).json(&payload),
                "predict",
            )
            .await?;

        Self::read_json(response, "predict").await
    }

    async fn batch_predict(
        &self,
        file: &UploadFile,
        identity: Option<&Identity>,
    ) -> Result<BatchResponse> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|_| {
                GatewayError::validation(format!("Invalid file type: {}", file.mime_type))
            })?;

        let mut form = Form::new().part("file", part);
        if let Some(identity) = identity {
            form = form.text("user_id", identity.as_str().to_string());
        }

        let response = self
            .send(
                self.http_client
                    .post(self.endpoint(&["batch_predict"])?)
                    .multipart(form),
                "batch_predict",
            )
            .await?;

        Self::read_json(response, "batch_predict").await
    }

    async fn save_content(&self, url: &str, identity: Option<&Identity>) -> Result<SavedContent> {
        let payload = UrlRequest {
            url,
            user_id: identity.map(Identity::as_str),
        };

        let response = self
            .send(
                self.http_client
                    .post(self.endpoint(&["save_content"])?)
                    .json(&payload),
                "save_content",
            )
            .await?;
        let saved: SaveContentResponse = Self::read_json(response, "save_content").await?;

        // Only reached once the server confirmed persistence
        let bytes = self.download(&saved.filename).await?;
        Ok(SavedContent {
            filename: saved.filename,
            bytes,
        })
    }

    async fn retrain(&self, urls: &[String], identity: Option<&Identity>) -> Result<RetrainOutcome> {
        let payload = RetrainRequest {
            urls,
            user_id: identity.map(Identity::as_str),
        };

        tracing::info!("Requesting retrain with {} URLs", urls.len());
        let response = self
            .send(
                self.http_client
                    .post(self.endpoint(&["retrain_model"])?)
                    .json(&payload),
                "retrain_model",
            )
            .await?;
        let ack: Acknowledgement = Self::read_json(response, "retrain_model").await?;

        Ok(RetrainOutcome {
            message: ack.into_message()?,
        })
    }

    async fn fetch_history(
        &self,
        identity: Option<&Identity>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        let mut request = self.http_client.get(self.endpoint(&["history"])?);
        if let Some(identity) = identity {
            request = request.query(&[("user_id", identity.as_str())]);
        }
        request = request.query(&[("limit", limit)]);

        let response = self.send(request, "history").await?;
        Self::read_json(response, "history").await
    }

    async fn fetch_analytics(
        &self,
        identity: Option<&Identity>,
        days: u32,
    ) -> Result<AnalyticsSummary> {
        let mut request = self.http_client.get(self.endpoint(&["analytics"])?);
        if let Some(identity) = identity {
            request = request.query(&[("user_id", identity.as_str())]);
        }
        request = request.query(&[("days", days)]);

        let response = self.send(request, "analytics").await?;
        Self::read_json(response, "analytics").await
    }

    async fn delete_history_entry(
        &self,
        entry_id: &str,
        identity: Option<&Identity>,
    ) -> Result<String> {
        let mut request = self
            .http_client
            .delete(self.endpoint(&["history", entry_id])?);
        if let Some(identity) = identity {
            request = request.query(&[("user_id", identity.as_str())]);
        }

        let response = self.send(request, "delete_history_entry").await?;
        let ack: Acknowledgement = Self::read_json(response, "delete_history_entry").await?;
        ack.into_message()
    }
}

// ============================================================================
// FAILURE CLASSIFICATION
// ============================================================================

fn classify_transport(error: &reqwest::Error, operation: &str) -> GatewayError {
    if error.is_builder() {
        GatewayError::unknown(format!("{} request could not be built: {}", operation, error))
    } else {
        GatewayError::network(format!("{} request failed: {}", operation, error))
    }
}

fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    let detail = extract_detail(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    match status {
        s if s.is_server_error() => GatewayError::server(detail),
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::CONFLICT
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::validation(detail),
        _ => GatewayError::unknown(format!("unexpected status {}: {}", status, body)),
    }
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Debug, Default)]
pub struct HttpBackendBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpBackendBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> anyhow::Result<HttpBackend> {
        let raw = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw).with_context(|| format!("Invalid base URL: {}", raw))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("Base URL must be an http(s) URL: {}", raw);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(HttpBackend {
            http_client,
            base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_endpoint_joins_segments() {
        let backend = HttpBackend::new("http://localhost:8080").unwrap();
        let url = backend.endpoint(&["history", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/history/abc");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = HttpBackend::new("http://localhost:8080/api/").unwrap();
        let url = backend.endpoint(&["predict"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/predict");
    }

    #[test]
    fn test_endpoint_escapes_filenames() {
        let backend = HttpBackend::new("http://localhost:8080").unwrap();
        let url = backend
            .endpoint(&["download_content", "http_a.com_x?y.txt"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/download_content/http_a.com_x%3Fy.txt"
        );
    }

    #[test]
    fn test_builder_rejects_non_http() {
        assert!(HttpBackend::new("ftp://example.com").is_err());
        assert!(HttpBackend::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"error": "No URL provided"}"#),
            GatewayError::validation("No URL provided")
        );
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "").kind(),
            ErrorKind::Server
        );
        assert_eq!(
            classify_status(StatusCode::IM_A_TEAPOT, "short and stout").kind(),
            ErrorKind::Unknown
        );
    }
}
