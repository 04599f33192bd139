use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while pulling a value from a single discovery source.
///
/// None of these are fatal: the resolver treats every variant as "this
/// source is exhausted" and moves on to the next tier.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed JSON from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("No usable '{field}' in response from {url}")]
    MissingField { url: String, field: String },

    #[error("Verification rejected {value} from {url}: {reason}")]
    VerificationFailed {
        url: String,
        value: String,
        reason: String,
    },
}

impl DiscoveryError {
    /// Transport and status failures are worth another attempt against the
    /// same source; anything about the payload itself is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Transport { .. } | DiscoveryError::Status { .. }
        )
    }
}

/// Errors related to the flat-file stores (caches, feeds, logs)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported document shape in {path:?}: {reason}")]
    Shape { path: PathBuf, reason: String },
}

/// Errors related to submitting predictions and claims over HTTP
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} rejected the request with HTTP {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
    },
}
