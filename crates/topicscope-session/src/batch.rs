use crate::sequence::{Completion, Sequenced};
use std::sync::Arc;
use tokio::sync::RwLock;
use topicscope_gateway::{Backend, BatchResponse, GatewayError};
use topicscope_types::{BatchResultItem, Identity, TopicGroups, UploadFile};

/// One batch response together with the grouping derived from it.
///
/// Built in one step so the grouping can never belong to another response.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub file_name: String,
    pub items: Vec<BatchResultItem>,
    pub groups: TopicGroups,
    pub batch_id: Option<String>,
}

impl BatchOutput {
    pub fn new(file_name: impl Into<String>, response: BatchResponse) -> Self {
        let groups = TopicGroups::from_items(&response.results);
        Self {
            file_name: file_name.into(),
            items: response.results,
            groups,
            batch_id: response.batch_id,
        }
    }

    pub fn cache_hits(&self) -> usize {
        self.items.iter().filter(|item| item.from_cache).count()
    }

    pub fn failures(&self) -> usize {
        self.items.iter().filter(|item| item.error().is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Submitting {
        file_name: String,
    },
    Succeeded(BatchOutput),
    Failed {
        file_name: String,
        error: GatewayError,
    },
}

impl BatchState {
    pub fn output(&self) -> Option<&BatchOutput> {
        match self {
            Self::Succeeded(output) => Some(output),
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

/// Drives multi-URL predictions from an uploaded text file
pub struct BatchSession {
    backend: Arc<dyn Backend>,
    identity: Identity,
    inner: RwLock<Sequenced<BatchState>>,
}

impl BatchSession {
    pub fn new(backend: Arc<dyn Backend>, identity: Identity) -> Self {
        Self {
            backend,
            identity,
            inner: RwLock::new(Sequenced::new(BatchState::Idle)),
        }
    }

    /// Only plain-text files are accepted
    pub fn validate_file(file: &UploadFile) -> Result<(), GatewayError> {
        if file.is_plain_text() {
            Ok(())
        } else {
            Err(GatewayError::validation(format!(
                "Please upload a text file (.txt), got {}",
                file.mime_type
            )))
        }
    }

    pub async fn state(&self) -> BatchState {
        self.inner.read().await.state().clone()
    }

    pub async fn submit(&self, file: UploadFile) -> Completion<Result<BatchOutput, GatewayError>> {
        if let Err(error) = Self::validate_file(&file) {
            tracing::debug!("Rejected batch file {} locally: {}", file.name, error);
            self.inner.write().await.reset(BatchState::Failed {
                file_name: file.name,
                error: error.clone(),
            });
            return Completion::Applied(Err(error));
        }

        let ticket = self.inner.write().await.begin(BatchState::Submitting {
            file_name: file.name.clone(),
        });
        tracing::debug!(
            "Submitting batch #{} from {} ({} lines)",
            ticket,
            file.name,
            file.url_lines().len()
        );

        let outcome = self
            .backend
            .batch_predict(&file, Some(&self.identity))
            .await
            .map(|response| BatchOutput::new(file.name.clone(), response));

        let next = match &outcome {
            Ok(output) => BatchState::Succeeded(output.clone()),
            Err(error) => BatchState::Failed {
                file_name: file.name.clone(),
                error: error.clone(),
            },
        };

        if self.inner.write().await.settle(ticket, next) {
            if let Ok(output) = &outcome {
                tracing::info!(
                    "Batch {} finished: {} items, {} topics, {} failures",
                    file.name,
                    output.items.len(),
                    output.groups.len(),
                    output.failures()
                );
            }
            Completion::Applied(outcome)
        } else {
            tracing::debug!("Discarding superseded batch #{}", ticket);
            Completion::Superseded
        }
    }

    pub async fn clear(&self) {
        self.inner.write().await.reset(BatchState::Idle);
    }
}
