//! # Topicscope
//!
//! Client-side orchestration for a URL topic classifier: predict the topic of
//! a page, classify whole files of URLs, curate past predictions into
//! retraining sets, and summarise usage.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use topicscope::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // One anonymous identity per installation
//!     let identity = global_identity(&FileIdentityStore::default_location());
//!
//!     let backend = BackendFactory::create_backend(&GatewayConfig::default())?;
//!     let session = PredictionSession::new(backend, identity.identity.clone());
//!
//!     match session.submit("https://example.com/article").await {
//!         Completion::Applied(Ok(result)) => println!("{}", result.topic),
//!         Completion::Applied(Err(error)) => eprintln!("{}", error.user_message()),
//!         Completion::Superseded => {}
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`topicscope-types`**: data model shared by every layer
//! - **`topicscope-gateway`**: the `Backend` trait, its HTTP implementation and
//!   the `GatewayError` taxonomy
//! - **`topicscope-session`**: identity, prediction, batch, history and
//!   analytics state machines
//!
//! Sessions only talk to `Arc<dyn Backend>`, so any backend (including test
//! doubles) can be plugged in.

pub mod prelude;

pub use topicscope_types::{
    AnalyticsSummary, BatchOutcome, BatchResultItem, DailyCount, HistoryEntry, Identity,
    PredictionResult, TopicCount, TopicGroup, TopicGroups, TopicShare, UploadFile, WordCount,
    PLAIN_TEXT_MIME,
};

pub use topicscope_gateway::{
    Backend, BackendFactory, BatchResponse, ErrorKind, GatewayConfig, GatewayError, HttpBackend,
    RetrainOutcome, SavedContent, DEFAULT_BASE_URL,
};

pub use topicscope_session::{
    activity_series, global_identity, paginate, topic_shares, ActionState, AnalyticsAggregator,
    AnalyticsState, BatchOutput, BatchSession, BatchState, Completion, FileIdentityStore,
    HistoryManager, HistoryOperation, HistoryPage, IdentityError, IdentityProvider,
    IdentitySource, IdentityStore, LoadState, MemoryIdentityStore, PredictionSession,
    PredictionState, ResolvedIdentity, SelectionState, DEFAULT_HISTORY_LIMIT, DEFAULT_PAGE_SIZE,
    DEFAULT_WINDOW_DAYS,
};
