use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use topicscope_types::{
    AnalyticsSummary, BatchResultItem, HistoryEntry, Identity, PredictionResult, UploadFile,
};

/// The remote classification service, one method per capability.
///
/// `identity` is sent as `user_id`; passing `None` asks the backend for the
/// global (unscoped) view. Every operation is idempotent from the caller's
/// perspective except [`Backend::retrain`] and [`Backend::delete_history_entry`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Classify the content behind a single URL
    async fn predict(&self, url: &str, identity: Option<&Identity>) -> Result<PredictionResult>;

    /// Classify every URL listed in a plain-text file
    async fn batch_predict(
        &self,
        file: &UploadFile,
        identity: Option<&Identity>,
    ) -> Result<BatchResponse>;

    /// Persist the scraped content server-side, then download it.
    ///
    /// The download is only attempted once the save is confirmed.
    async fn save_content(&self, url: &str, identity: Option<&Identity>) -> Result<SavedContent>;

    /// Feed previously seen URLs back into the classifier.
    /// Each call may change server-side model state.
    async fn retrain(&self, urls: &[String], identity: Option<&Identity>) -> Result<RetrainOutcome>;

    /// Most recent predictions first
    async fn fetch_history(
        &self,
        identity: Option<&Identity>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>>;

    /// Topic distribution and daily activity over the trailing `days`
    async fn fetch_analytics(
        &self,
        identity: Option<&Identity>,
        days: u32,
    ) -> Result<AnalyticsSummary>;

    /// Delete one history entry. A repeated delete of the same id reports
    /// `Validation` (not found).
    async fn delete_history_entry(
        &self,
        entry_id: &str,
        identity: Option<&Identity>,
    ) -> Result<String>;
}

/// Batch prediction response. The server's own `grouped_results` is
/// deliberately not kept; grouping is recomputed from `results`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchResultItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

/// Content saved by the backend and fetched back for local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedContent {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrainOutcome {
    pub message: String,
}
