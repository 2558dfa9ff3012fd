use thiserror::Error;

/// Normalized failure taxonomy shared by every remote operation.
///
/// The HTTP layer is the only place that translates transport details into
/// these variants; nothing above it inspects status codes or socket errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Request rejected before reaching the model; detail is the server's (or
    /// the local validator's) message, verbatim
    #[error("{0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Discriminant of [`GatewayError`], for matching without the detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Server,
    Network,
    Unknown,
}

impl GatewayError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn server(detail: impl Into<String>) -> Self {
        Self::Server(detail.into())
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::Network(detail.into())
    }

    /// Build an `Unknown` error, logging the full detail for diagnosis
    pub fn unknown(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!("Unclassified gateway failure: {}", detail);
        Self::Unknown(detail)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Server(_) => ErrorKind::Server,
            Self::Network(_) => ErrorKind::Network,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(d) | Self::Server(d) | Self::Network(d) | Self::Unknown(d) => d,
        }
    }

    /// Whether offering the user a manual retry makes sense.
    /// Nothing in this crate ever retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Server | ErrorKind::Network)
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(d) => d.clone(),
            Self::Server(d) => format!("The server failed to process the request: {}", d),
            Self::Network(_) => {
                "No response received from the server. Check your connection and try again."
                    .to_string()
            }
            Self::Unknown(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
