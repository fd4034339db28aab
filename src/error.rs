//! Error types surfaced by the provider.

use thiserror::Error;

/// Errors returned by provider operations.
///
/// Every variant maps onto a gRPC status code, and the gRPC layer turns
/// them into error diagnostics carried in the response.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote object does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Configuration or state failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Provider configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The resource or data source type is not served by this provider.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The gRPC transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The API rejected the credentials.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The API rate limit was exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The API is unreachable or failing server-side.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The request timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The operation needs a state the provider is not in, e.g. unconfigured.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// The operation is not supported for this type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// The API rejected the request as malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// The bare message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Internal(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::PermissionDenied(msg)
            | Self::ResourceExhausted(msg)
            | Self::Unavailable(msg)
            | Self::DeadlineExceeded(msg)
            | Self::FailedPrecondition(msg)
            | Self::Unimplemented(msg)
            | Self::InvalidRequest(msg) => msg,
            Self::Serialization(_) => "serialization error (see Debug output)",
            Self::Transport(_) => "transport error (see Debug output)",
        }
    }

    /// Prefix the message with `context`, keeping the variant.
    ///
    /// Wrapped serde and transport errors become `Internal` and
    /// `Unavailable` so the text can carry the context.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        let wrap = |msg: String| format!("{}: {}", context, msg);
        match self {
            Self::NotFound(msg) => Self::NotFound(wrap(msg)),
            Self::Validation(msg) => Self::Validation(wrap(msg)),
            Self::Internal(msg) => Self::Internal(wrap(msg)),
            Self::Configuration(msg) => Self::Configuration(wrap(msg)),
            Self::UnknownResource(msg) => Self::UnknownResource(wrap(msg)),
            Self::PermissionDenied(msg) => Self::PermissionDenied(wrap(msg)),
            Self::ResourceExhausted(msg) => Self::ResourceExhausted(wrap(msg)),
            Self::Unavailable(msg) => Self::Unavailable(wrap(msg)),
            Self::DeadlineExceeded(msg) => Self::DeadlineExceeded(wrap(msg)),
            Self::FailedPrecondition(msg) => Self::FailedPrecondition(wrap(msg)),
            Self::Unimplemented(msg) => Self::Unimplemented(wrap(msg)),
            Self::InvalidRequest(msg) => Self::InvalidRequest(wrap(msg)),
            Self::Serialization(err) => Self::Internal(wrap(err.to_string())),
            Self::Transport(err) => Self::Unavailable(wrap(err.to_string())),
        }
    }

    /// A short title used as the diagnostic summary.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource not found",
            Self::Validation(_) => "Invalid configuration",
            Self::Internal(_) => "Internal provider error",
            Self::Configuration(_) => "Provider configuration error",
            Self::UnknownResource(_) => "Unknown resource type",
            Self::Serialization(_) => "Invalid JSON payload",
            Self::Transport(_) => "Transport error",
            Self::PermissionDenied(_) => "NodePing authentication failed",
            Self::ResourceExhausted(_) => "NodePing rate limit exceeded",
            Self::Unavailable(_) => "NodePing API unavailable",
            Self::DeadlineExceeded(_) => "NodePing request timed out",
            Self::FailedPrecondition(_) => "Provider not ready",
            Self::Unimplemented(_) => "Operation not supported",
            Self::InvalidRequest(_) => "NodePing rejected the request",
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::ResourceExhausted(msg) => tonic::Status::resource_exhausted(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
        }
    }
}
