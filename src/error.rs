//! # Errors
//!
//! Errors raised while signing with a remote key service. Nothing in this
//! crate recovers from an error locally: every failure is returned to the
//! caller (usually a credential issuance pipeline) which owns retry and
//! fallback policy.

use thiserror::Error;

/// Result type for the KMS signer.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Typed errors for the KMS signer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Required configuration is missing or invalid. Fatal at setup.
    #[error("invalid_config: {0}")]
    Configuration(String),

    /// The key service could not be reached or returned a non-success
    /// status. `status` is `None` when no HTTP response was received.
    #[error("remote_service_error: {} {reason}", status_text(.status))]
    RemoteService {
        /// HTTP status code returned by the key service.
        status: Option<u16>,

        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The requested proof type is not supported by this provider.
    #[error("unsupported_proof_type: {0}")]
    UnsupportedProofType(String),

    /// The operation is never supported (e.g. verifying with a remote key).
    #[error("unsupported_operation: {0}")]
    UnsupportedOperation(String),

    /// Input could not be parsed (see message for details).
    #[error("malformed_input: {0}")]
    MalformedInput(String),

    /// A DID could not be resolved to a document.
    #[error("resolution_error: {0}")]
    Resolution(String),

    /// A document could not be canonicalized.
    #[error("canonicalization_error: {0}")]
    Canonicalization(String),
}

impl Error {
    /// Returns `true` if the error was raised by (or while reaching) the key
    /// service.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteService { .. })
    }

    /// Build a [`Error::RemoteService`] from a non-success response status.
    pub(crate) fn remote(status: reqwest::StatusCode, context: &str) -> Self {
        let reason = status.canonical_reason().unwrap_or("unknown");
        tracing::error!("{context}: {} {reason}", status.as_u16());
        Self::RemoteService {
            status: Some(status.as_u16()),
            reason: format!("{context}: {reason}"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("key service request failed: {err}");
        Self::RemoteService {
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

fn status_text(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}
