//! Error types for the atlas-extract crate.

use thiserror::Error;

use crate::retry::is_rate_limit_message;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Missing API key for provider {provider}: set {env_var}")]
    MissingCredentials {
        provider: String,
        env_var: &'static str,
    },

    #[error("No text received on stdin")]
    EmptyInput,

    #[error("Unsupported input file format: {0}")]
    UnsupportedInput(String),

    #[error("Unknown extraction provider: {0}")]
    UnknownProvider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API returned {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// The model's output does not have the shape of a knowledge graph.
    #[error("Failed to decode extraction output: {0}")]
    Decode(String),

    #[error("API rate limit error after {attempts} retries: {message}")]
    RateLimitExhausted { attempts: u32, message: String },

    #[error("All extraction providers failed: {0}")]
    AllProvidersFailed(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Core(#[from] atlas_core::AtlasError),

    #[error("Graph error: {0}")]
    Graph(#[from] atlas_graph::GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether the failure is a provider-side rate limit worth retrying.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Api {
                status: 429 | 503, ..
            } => true,
            Self::Api { message, .. } => is_rate_limit_message(message),
            Self::Http(e) => e
                .status()
                .is_some_and(|s| s.as_u16() == 429 || s.as_u16() == 503),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, message: &str) -> ExtractError {
        ExtractError::Api {
            provider: "gemini".into(),
            status,
            message: message.into(),
        }
    }

    #[test]
    fn test_rate_limit_by_status() {
        assert!(api(429, "Quota exceeded").is_rate_limited());
        assert!(api(503, "").is_rate_limited());
        assert!(!api(400, "Invalid argument").is_rate_limited());
    }

    #[test]
    fn test_rate_limit_by_message() {
        assert!(api(500, "RESOURCE_EXHAUSTED: try later").is_rate_limited());
        assert!(api(500, "The model is overloaded").is_rate_limited());
        assert!(api(500, "超出速率限制").is_rate_limited());
    }

    #[test]
    fn test_other_errors_not_retried() {
        assert!(!ExtractError::EmptyInput.is_rate_limited());
        assert!(!ExtractError::Decode("ResourceExhausted".into()).is_rate_limited());
    }

    #[test]
    fn test_exhausted_message() {
        let err = ExtractError::RateLimitExhausted {
            attempts: 5,
            message: "Quota exceeded".into(),
        };
        assert_eq!(
            err.to_string(),
            "API rate limit error after 5 retries: Quota exceeded"
        );
    }
}
