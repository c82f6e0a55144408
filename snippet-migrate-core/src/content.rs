//! Content resolution: one file at one commit.
//!
//! Not-found is a valid answer (the file did not exist yet, or had been
//! removed). Bytes that are not valid UTF-8 are replaced character by
//! character rather than rejected.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::contract::{ArtifactSource, Commit, RevisionContent, RevisionFeed};
use crate::error::ContentFetchError;

/// Text of `file_name` at `commit_hash`, `Ok(None)` when absent.
pub async fn content_at<S>(
    source: &S,
    artifact_id: &str,
    commit_hash: &str,
    file_name: &str,
) -> Result<Option<String>, ContentFetchError>
where
    S: ArtifactSource + ?Sized,
{
    let raw = source
        .file_at(artifact_id, commit_hash, file_name)
        .await
        .map_err(|e| ContentFetchError {
            artifact_id: artifact_id.to_string(),
            commit_hash: commit_hash.to_string(),
            file_name: file_name.to_string(),
            source: e,
        })?;

    Ok(raw.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

/// [`RevisionFeed`] for one (artifact, file) pair.
pub struct ContentResolver<'a, S: ?Sized> {
    source: &'a S,
    artifact_id: &'a str,
    file_name: &'a str,
}

impl<'a, S> ContentResolver<'a, S>
where
    S: ArtifactSource + ?Sized,
{
    pub fn new(source: &'a S, artifact_id: &'a str, file_name: &'a str) -> Self {
        Self {
            source,
            artifact_id,
            file_name,
        }
    }
}

#[async_trait]
impl<'a, S> RevisionFeed for ContentResolver<'a, S>
where
    S: ArtifactSource + ?Sized,
{
    async fn content_at(&self, commit: &Commit) -> RevisionContent {
        debug!(
            artifact_id = self.artifact_id,
            file = self.file_name,
            commit = commit.short_hash(),
            "Fetching file content"
        );
        match content_at(self.source, self.artifact_id, &commit.hash, self.file_name).await {
            Ok(Some(text)) => RevisionContent::Present(text),
            Ok(None) => {
                info!(
                    file = self.file_name,
                    commit = commit.short_hash(),
                    "File not present in this revision"
                );
                RevisionContent::Absent
            }
            Err(e) => {
                warn!(error = %e, file = self.file_name, commit = commit.short_hash(), "Could not fetch file content");
                RevisionContent::Unavailable
            }
        }
    }
}
