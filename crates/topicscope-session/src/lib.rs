pub mod analytics;
pub mod batch;
pub mod history;
pub mod identity;
pub mod prediction;
pub mod sequence;
pub mod validation;

pub use analytics::{
    activity_series, topic_shares, AnalyticsAggregator, AnalyticsState, DEFAULT_WINDOW_DAYS,
};
pub use batch::{BatchOutput, BatchSession, BatchState};
pub use history::{
    paginate, ActionState, HistoryManager, HistoryOperation, HistoryPage, LoadState,
    SelectionState, DEFAULT_HISTORY_LIMIT, DEFAULT_PAGE_SIZE,
};
pub use identity::{
    global_identity, FileIdentityStore, IdentityError, IdentityProvider, IdentitySource,
    IdentityStore, MemoryIdentityStore, ResolvedIdentity,
};
pub use prediction::{PredictionSession, PredictionState};
pub use sequence::Completion;
