//! # contract: the two remote systems as the engine sees them
//!
//! This module defines the data model shared by every component and the
//! traits through which the engine talks to the outside world:
//!
//! - [`ArtifactSource`]: the source collection store (snippets with files and
//!   a linear commit history). Read-only from the engine's perspective.
//! - [`DocumentStore`]: the target document store (containers holding named
//!   pages, each page with its own revision history).
//! - [`RevisionFeed`]: materialises one file's content at one commit, on
//!   demand, for the page synchronizer.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can generate
//!   deterministic mocks. The mocks are exported behind the
//!   `test-export-mocks` feature for use by dependent crates.
//! - The traits carry no global state: base URLs and credentials belong to
//!   the concrete clients, which receive them through their constructors.
//!
//! ## Error contract
//! - Methods return [`ApiError`] for anything that went wrong on the wire.
//! - Expected absence is data, not an error: [`ArtifactSource::file_at`]
//!   answers `Ok(None)` on not-found, [`DocumentStore::find_page`] answers
//!   `Ok(None)` when no page carries the name.

use async_trait::async_trait;

use mockall::automock;

use crate::error::ApiError;

/// Length of the abbreviated commit hash used in logs and provenance.
pub const SHORT_HASH_LEN: usize = 7;

/// An artifact as it appears in the source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub id: String,
    pub title: String,
}

/// Full artifact metadata, including its current file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    /// Current file names, in listing order.
    pub files: Vec<String>,
    /// Last-known update timestamp, used for the synthetic "current state" commit.
    pub updated_on: Option<String>,
}

/// One historical state transition of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub date: String,
    pub author: String,
    pub message: String,
    /// True for the fallback commit synthesised when no history exists.
    pub synthetic: bool,
}

impl Commit {
    pub fn short_hash(&self) -> &str {
        match self.hash.char_indices().nth(SHORT_HASH_LEN) {
            Some((idx, _)) => &self.hash[..idx],
            None => &self.hash,
        }
    }

    /// Human-readable provenance line: short hash, author, timestamp, message.
    pub fn provenance(&self) -> String {
        format!(
            "Commit {} by {} on {}. Msg: {}",
            self.short_hash(),
            self.author,
            self.date,
            self.message
        )
    }
}

/// A destination grouping object, one per migrated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: i64,
    pub name: String,
}

/// A destination document, one per migrated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: i64,
    pub name: String,
}

/// A file's content at one commit, as materialised for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionContent {
    /// The file existed; invalid UTF-8 has been replaced, never rejected.
    Present(String),
    /// The file did not exist at this commit.
    Absent,
    /// The fetch failed. Replay treats this like `Absent` but it is logged apart.
    Unavailable,
}

/// Read access to the source collection store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// All artifacts of the configured workspace, across every listing page.
    async fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>, ApiError>;

    /// Metadata of one artifact, including its current file listing.
    async fn artifact(&self, artifact_id: &str) -> Result<Artifact, ApiError>;

    /// Commit history exactly as the source returns it (newest first).
    async fn commits(&self, artifact_id: &str) -> Result<Vec<Commit>, ApiError>;

    /// Raw bytes of `file_name` at `commit_hash`; `Ok(None)` when not found.
    async fn file_at(
        &self,
        artifact_id: &str,
        commit_hash: &str,
        file_name: &str,
    ) -> Result<Option<Vec<u8>>, ApiError>;
}

/// Read/write access to the target document store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Containers returned by the store's name filter, in listing order.
    ///
    /// The filter may be fuzzy; exact matching is the caller's job.
    async fn find_containers(&self, name: &str) -> Result<Vec<Container>, ApiError>;

    /// Create a container tagged as an import of the named artifact.
    async fn create_container(&self, name: &str) -> Result<Container, ApiError>;

    /// The first page named exactly `name` within the container, if any.
    async fn find_page(&self, container_id: i64, name: &str) -> Result<Option<Page>, ApiError>;

    /// The page's current body; `Ok(None)` if the store does not expose one.
    async fn page_body(&self, page_id: i64) -> Result<Option<String>, ApiError>;

    /// Create a page; its first revision holds `body`.
    async fn create_page(
        &self,
        container_id: i64,
        name: &str,
        body: &str,
    ) -> Result<Page, ApiError>;

    /// Replace the page body, adding one revision described by `summary`.
    async fn update_page(&self, page_id: i64, body: &str, summary: &str)
        -> Result<Page, ApiError>;
}

/// Supplies one file's content per commit, pulled lazily by the synchronizer.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RevisionFeed: Send + Sync {
    async fn content_at(&self, commit: &Commit) -> RevisionContent;
}
