pub mod config;
pub mod error;
pub mod http;
pub mod traits;

pub use config::{BackendFactory, GatewayConfig, DEFAULT_BASE_URL};
pub use error::{ErrorKind, GatewayError, Result};
pub use http::HttpBackend;
pub use traits::{Backend, BatchResponse, RetrainOutcome, SavedContent};
