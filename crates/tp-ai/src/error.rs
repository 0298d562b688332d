//! Provider error types.

use thiserror::Error;

/// Errors raised by AI providers and the provider manager.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key not configured")]
    NotConfigured { provider: &'static str },

    #[error("{provider} request failed: {message}")]
    Http {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} returned HTTP {status}: {message}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} API error: {message}")]
    Vendor {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} provider does not support {operation}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    #[error("no AI provider selected")]
    NoProvider,
}

impl ProviderError {
    /// Map a transport-level reqwest failure.
    pub(crate) fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Http {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// True for caller errors that no retry or fallback can fix.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            ProviderError::Unsupported { .. } | ProviderError::NoProvider
        )
    }
}

/// Convenience alias for provider results.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_provider_and_message() {
        let err = ProviderError::Vendor {
            provider: "minimax",
            message: "invalid api key".into(),
        };
        assert_eq!(err.to_string(), "minimax API error: invalid api key");
    }

    #[test]
    fn unsupported_classification() {
        assert!(ProviderError::NoProvider.is_unsupported());
        assert!(
            ProviderError::Unsupported {
                provider: "simple",
                operation: "generic completion"
            }
            .is_unsupported()
        );
        assert!(!ProviderError::Timeout { provider: "openai" }.is_unsupported());
    }
}
