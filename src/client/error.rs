//! Errors raised by the NodePing API client.

use thiserror::Error;

use crate::error::ProviderError;

/// Errors returned by [`Client`](super::Client) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a status of 400 or above.
    #[error("NodePing API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the `{"error": ...}` body, or the raw body.
        message: String,
    },

    /// A get-by-id lookup returned 404.
    #[error("{resource_type} with ID \"{id}\" not found")]
    NotFound {
        /// `check` or `contact`.
        resource_type: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A delete call answered `ok: false`.
    #[error("delete {0} returned ok=false")]
    DeleteRejected(&'static str),
}

impl ClientError {
    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// True for 404 answers and explicit not-found lookups.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for 401 and 403 answers.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Only API errors with status 429 or >= 500 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err {
            ClientError::NotFound { .. } => ProviderError::NotFound(message),
            ClientError::Api { status, .. } => match status {
                404 => ProviderError::NotFound(message),
                401 | 403 => ProviderError::PermissionDenied(message),
                429 => ProviderError::ResourceExhausted(message),
                s if s >= 500 => ProviderError::Unavailable(message),
                _ => ProviderError::InvalidRequest(message),
            },
            ClientError::Http(e) if e.is_timeout() => ProviderError::DeadlineExceeded(message),
            ClientError::Http(_) => ProviderError::Unavailable(message),
            ClientError::Decode(e) => ProviderError::Serialization(e),
            ClientError::InvalidUrl(_) => ProviderError::Configuration(message),
            ClientError::DeleteRejected(_) => ProviderError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClientError {
        ClientError::Api {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            api(400).to_string(),
            "NodePing API error (status 400): boom"
        );
        let err = ClientError::NotFound {
            resource_type: "check",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "check with ID \"abc\" not found");
    }

    #[test]
    fn test_classification() {
        assert!(api(404).is_not_found());
        assert!(api(401).is_unauthorized());
        assert!(api(403).is_unauthorized());
        assert!(!api(404).is_unauthorized());

        assert!(api(429).is_retryable());
        assert!(api(500).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(!ClientError::DeleteRejected("check").is_retryable());
    }

    #[test]
    fn test_provider_error_mapping() {
        assert!(matches!(
            ProviderError::from(api(401)),
            ProviderError::PermissionDenied(_)
        ));
        assert!(matches!(
            ProviderError::from(api(429)),
            ProviderError::ResourceExhausted(_)
        ));
        assert!(matches!(
            ProviderError::from(api(502)),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            ProviderError::from(api(422)),
            ProviderError::InvalidRequest(_)
        ));
        let err = ProviderError::from(ClientError::NotFound {
            resource_type: "contact",
            id: "x".to_string(),
        });
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert_eq!(err.message(), "contact with ID \"x\" not found");
    }
}
