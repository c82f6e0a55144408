//! Error types for snippet-migrate-core.
//!
//! Failures never cross a component boundary as panics. Each component
//! returns one of these, and its immediate caller decides the skip/abort
//! scope (revision, file or artifact).

use thiserror::Error;

/// Transport, status, decode and shape failures of a single remote call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// JSON was expected but the body could not be parsed.
    #[error("could not decode JSON from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The response parsed but lacks a field the caller cannot do without.
    #[error("response from {url} is missing `{field}`")]
    MissingField { url: String, field: &'static str },
}

impl ApiError {
    /// HTTP status code, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The container for an artifact could neither be found nor created.
/// The caller skips the whole artifact.
#[derive(Debug, Error)]
pub enum ContainerCreateError {
    #[error("could not search for container `{name}`: {source}")]
    Lookup {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("could not create container `{name}`: {source}")]
    Create {
        name: String,
        #[source]
        source: ApiError,
    },
}

/// The commit listing of an artifact could not be retrieved.
#[derive(Debug, Error)]
#[error("could not fetch commit history of artifact {artifact_id}: {source}")]
pub struct HistoryFetchError {
    pub artifact_id: String,
    #[source]
    pub source: ApiError,
}

/// Fetching one file at one commit failed for a reason other than absence.
#[derive(Debug, Error)]
#[error("could not fetch `{file_name}` at {commit_hash} of artifact {artifact_id}: {source}")]
pub struct ContentFetchError {
    pub artifact_id: String,
    pub commit_hash: String,
    pub file_name: String,
    #[source]
    pub source: ApiError,
}

/// The only run-level failure: the initial artifact listing is unavailable.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("could not list artifacts: {0}")]
    Listing(#[source] ApiError),
}
