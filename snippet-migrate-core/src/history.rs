//! Revision sequencing: an artifact's commits, oldest first.
//!
//! Replay assumes monotonic order, so the newest-first listing of the source
//! is reversed here and nowhere else.

use tracing::{error, info, warn};

use crate::contract::{Artifact, ArtifactSource, Commit};
use crate::error::HistoryFetchError;

/// Hash of the fallback commit used when an artifact reports no history.
pub const CURRENT_STATE_HASH: &str = "HEAD";

/// The single commit standing in for "current state only".
pub fn current_state_commit(artifact: &Artifact) -> Commit {
    Commit {
        hash: CURRENT_STATE_HASH.to_string(),
        date: artifact
            .updated_on
            .clone()
            .unwrap_or_else(|| String::from("N/A")),
        author: String::from("N/A"),
        message: String::from("Current state"),
        synthetic: true,
    }
}

/// Commits of `artifact` in replay order. Never empty on success.
pub async fn commits_for<S>(source: &S, artifact: &Artifact) -> Result<Vec<Commit>, HistoryFetchError>
where
    S: ArtifactSource + ?Sized,
{
    let mut commits = source.commits(&artifact.id).await.map_err(|e| {
        error!(artifact_id = %artifact.id, error = %e, "Failed to fetch commits");
        HistoryFetchError {
            artifact_id: artifact.id.clone(),
            source: e,
        }
    })?;

    if commits.is_empty() {
        warn!(
            artifact_id = %artifact.id,
            "No commit history found, replaying current content only"
        );
        return Ok(vec![current_state_commit(artifact)]);
    }

    commits.reverse();
    info!(artifact_id = %artifact.id, count = commits.len(), "Commit history ordered oldest first");
    Ok(commits)
}
