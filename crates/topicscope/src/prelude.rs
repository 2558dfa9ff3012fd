//! Prelude module for convenient imports
//!
//! ```rust
//! use topicscope::prelude::*;
//! ```

pub use crate::{
    global_identity, AnalyticsAggregator, Backend, BackendFactory, BatchSession, Completion,
    ErrorKind, FileIdentityStore, GatewayConfig, GatewayError, HistoryEntry, HistoryManager,
    Identity, PredictionResult, PredictionSession, UploadFile,
};
