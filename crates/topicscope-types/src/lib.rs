pub mod analytics;
pub mod batch;
pub mod history;
pub mod identity;
pub mod prediction;
pub mod upload;

pub use analytics::{AnalyticsSummary, DailyCount, TopicCount, TopicShare};
pub use batch::{BatchOutcome, BatchResultItem, TopicGroup, TopicGroups};
pub use history::HistoryEntry;
pub use identity::Identity;
pub use prediction::{PredictionResult, WordCount};
pub use upload::{UploadFile, PLAIN_TEXT_MIME};
