use crate::sequence::{Completion, Sequenced};
use crate::validation::validate_url;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use topicscope_gateway::{Backend, GatewayError};
use topicscope_types::{Identity, PredictionResult};

/// Lifecycle of a single-URL prediction.
///
/// Exactly one of result/error can be present, and only after submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PredictionState {
    #[default]
    Idle,
    Submitting {
        url: String,
    },
    Succeeded {
        url: String,
        result: PredictionResult,
    },
    Failed {
        url: String,
        error: GatewayError,
    },
}

impl PredictionState {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Submitting { url } | Self::Succeeded { url, .. } | Self::Failed { url, .. } => {
                Some(url)
            }
        }
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            Self::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }
}

/// Drives single-URL predictions for one identity.
///
/// A newer `submit` supersedes any request still in flight: the older
/// response is discarded when it arrives.
pub struct PredictionSession {
    backend: Arc<dyn Backend>,
    identity: Identity,
    inner: RwLock<Sequenced<PredictionState>>,
}

impl PredictionSession {
    pub fn new(backend: Arc<dyn Backend>, identity: Identity) -> Self {
        Self {
            backend,
            identity,
            inner: RwLock::new(Sequenced::new(PredictionState::Idle)),
        }
    }

    pub async fn state(&self) -> PredictionState {
        self.inner.read().await.state().clone()
    }

    /// Predict the topic of `url`.
    ///
    /// Empty or implausible URLs fail locally without a network call.
    pub async fn submit(&self, url: &str) -> Completion<Result<PredictionResult, GatewayError>> {
        let url = match validate_url(url) {
            Ok(url) => url,
            Err(error) => {
                tracing::debug!("Rejected prediction input locally: {}", error);
                self.inner.write().await.reset(PredictionState::Failed {
                    url: url.to_string(),
                    error: error.clone(),
                });
                return Completion::Applied(Err(error));
            }
        };

        let ticket = self
            .inner
            .write()
            .await
            .begin(PredictionState::Submitting { url: url.clone() });
        tracing::debug!("Submitting prediction #{} for {}", ticket, url);

        let outcome = self.backend.predict(&url, Some(&self.identity)).await;

        let next = match &outcome {
            Ok(result) => PredictionState::Succeeded {
                url: url.clone(),
                result: result.clone(),
            },
            Err(error) => PredictionState::Failed {
                url: url.clone(),
                error: error.clone(),
            },
        };

        if self.inner.write().await.settle(ticket, next) {
            if let Ok(result) = &outcome {
                tracing::info!(
                    "Predicted '{}' for {} (cached: {})",
                    result.topic,
                    url,
                    result.from_cache
                );
            }
            Completion::Applied(outcome)
        } else {
            tracing::debug!("Discarding superseded prediction #{} for {}", ticket, url);
            Completion::Superseded
        }
    }

    /// Back to `Idle` with no url, result or error
    pub async fn clear(&self) {
        self.inner.write().await.reset(PredictionState::Idle);
    }

    /// Have the backend save the content behind the current URL and write the
    /// downloaded copy into `dir`. A missing or invalid URL fails locally.
    pub async fn save_content(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        // A locally rejected submit leaves its raw input in state
        let state = self.state().await;
        let url = validate_url(state.url().unwrap_or_default())?;

        let saved = self
            .backend
            .save_content(&url, Some(&self.identity))
            .await?;

        // The backend flattens the URL into a filename; keep only the last
        // component regardless
        let filename = Path::new(&saved.filename)
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "content.txt".into());
        let target = dir.join(filename);

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        tokio::fs::write(&target, &saved.bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;

        tracing::info!("Saved content for {} to {}", url, target.display());
        Ok(target)
    }
}
