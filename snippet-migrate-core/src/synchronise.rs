//! High-level pipeline: replays every artifact's history into the document store.
//!
//! This module provides the top-level orchestration of a migration run. For
//! each artifact in the source listing it:
//!   - resolves or creates the artifact's container (lookup-before-create)
//!   - fetches the artifact's current file listing
//!   - orders the commit history oldest first (or synthesises "current state")
//!   - runs one independent page replay per file, pulling content on demand
//!   - aggregates a report of what was created, updated, skipped and failed.
//!
//! # Major Types
//! - [`MigrationReport`]: per-artifact, per-file outcome of the run
//! - [`ArtifactReport`] / [`ArtifactOutcome`]: artifact-level skip and abort scopes
//!
//! # Error Handling
//! Only the initial listing is fatal ([`MigrationError`]). Everything below
//! is contained: an artifact-level failure skips that artifact, a file-level
//! failure skips that file, a revision-level failure is logged and replay
//! moves on. Nothing is retried; re-running the whole migration is safe
//! because containers and pages are looked up by name before anything is
//! created.
//!
//! # Execution
//! Strictly sequential: artifacts, then files, then commits, each awaited
//! before the next starts. No state is shared between files beyond what the
//! destination itself holds.

use tracing::{error, info, warn};

use crate::config::MigrationOptions;
use crate::container::ContainerResolver;
use crate::content::ContentResolver;
use crate::contract::{ArtifactSource, ArtifactSummary, DocumentStore};
use crate::error::MigrationError;
use crate::history::commits_for;
use crate::page_sync::{FileOutcome, PageSynchronizer, PageTarget};

pub use crate::page_sync::FileReport;

/// How one artifact's migration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// Every file had its own replay (individual files may still have failed).
    Migrated,
    /// The container existed and skipping existing containers was requested.
    SkippedExistingContainer,
    /// The container could not be found or created.
    ContainerFailed,
    /// The artifact's file listing could not be fetched.
    DetailsUnavailable,
    /// The artifact has no files.
    NoFiles,
    /// The commit history could not be fetched.
    HistoryUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    pub artifact_id: String,
    pub title: String,
    pub container_id: Option<i64>,
    pub outcome: ArtifactOutcome,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub artifacts: Vec<ArtifactReport>,
}

impl MigrationReport {
    pub fn files(&self) -> impl Iterator<Item = &FileReport> {
        self.artifacts.iter().flat_map(|a| a.files.iter())
    }

    pub fn pages_created(&self) -> usize {
        self.files().filter(|f| f.created).count()
    }

    pub fn page_updates(&self) -> usize {
        self.files().map(|f| f.updates).sum()
    }

    pub fn failed_files(&self) -> usize {
        self.files()
            .filter(|f| {
                matches!(
                    f.outcome,
                    FileOutcome::CreateFailed | FileOutcome::LookupFailed
                )
            })
            .count()
    }
}

/// Entrypoint: migrate every artifact the source lists (or just the one in
/// `options.only_artifact`).
pub async fn synchronise<S, D>(
    options: &MigrationOptions,
    source: &S,
    store: &D,
) -> Result<MigrationReport, MigrationError>
where
    S: ArtifactSource + ?Sized,
    D: DocumentStore + ?Sized,
{
    info!("[MIGRATE] Starting migration run");

    let artifacts = match &options.only_artifact {
        Some(id) => {
            info!(artifact_id = %id, "[MIGRATE] Restricting run to one artifact");
            let artifact = source.artifact(id).await.map_err(|e| {
                error!(error = %e, artifact_id = %id, "[MIGRATE][ERROR] Failed to fetch the requested artifact");
                MigrationError::Listing(e)
            })?;
            vec![ArtifactSummary {
                id: artifact.id,
                title: artifact.title,
            }]
        }
        None => source.list_artifacts().await.map_err(|e| {
            error!(error = %e, "[MIGRATE][ERROR] Failed to list artifacts");
            MigrationError::Listing(e)
        })?,
    };

    if artifacts.is_empty() {
        info!("[MIGRATE] No artifacts found matching the criteria");
    }

    let mut report = MigrationReport::default();
    for summary in &artifacts {
        let artifact_report = migrate_artifact(options, source, store, summary).await;
        info!(
            artifact_id = %artifact_report.artifact_id,
            outcome = ?artifact_report.outcome,
            files = artifact_report.files.len(),
            "[MIGRATE] Artifact finished"
        );
        report.artifacts.push(artifact_report);
    }

    info!(
        artifacts = report.artifacts.len(),
        pages_created = report.pages_created(),
        page_updates = report.page_updates(),
        failed_files = report.failed_files(),
        "[MIGRATE] Migration complete"
    );
    Ok(report)
}

async fn migrate_artifact<S, D>(
    options: &MigrationOptions,
    source: &S,
    store: &D,
    summary: &ArtifactSummary,
) -> ArtifactReport
where
    S: ArtifactSource + ?Sized,
    D: DocumentStore + ?Sized,
{
    info!(artifact_id = %summary.id, title = %summary.title, "[MIGRATE] Processing artifact");
    let mut report = ArtifactReport {
        artifact_id: summary.id.clone(),
        title: summary.title.clone(),
        container_id: None,
        outcome: ArtifactOutcome::Migrated,
        files: Vec::new(),
    };

    let resolved = match ContainerResolver::new(store).get_or_create(&summary.title).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, artifact_id = %summary.id, "[MIGRATE][ERROR] No container, skipping artifact");
            report.outcome = ArtifactOutcome::ContainerFailed;
            return report;
        }
    };
    report.container_id = Some(resolved.container.id);
    if resolved.existed && options.skip_existing_containers {
        info!(container_id = resolved.container.id, title = %summary.title, "[MIGRATE] Container exists, skipping artifact as requested");
        report.outcome = ArtifactOutcome::SkippedExistingContainer;
        return report;
    }

    let artifact = match source.artifact(&summary.id).await {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!(error = %e, artifact_id = %summary.id, "[MIGRATE] Could not get file list, skipping artifact");
            report.outcome = ArtifactOutcome::DetailsUnavailable;
            return report;
        }
    };
    if artifact.files.is_empty() {
        info!(artifact_id = %artifact.id, "[MIGRATE] Artifact has no files, skipping");
        report.outcome = ArtifactOutcome::NoFiles;
        return report;
    }

    let commits = match commits_for(source, &artifact).await {
        Ok(commits) => commits,
        Err(e) => {
            error!(error = %e, "[MIGRATE][ERROR] Skipping files within this artifact");
            report.outcome = ArtifactOutcome::HistoryUnavailable;
            return report;
        }
    };

    let synchronizer = PageSynchronizer::new(store, options.page_header);
    for file_name in &artifact.files {
        info!(file = %file_name, commits = commits.len(), "[MIGRATE] Processing file");
        let feed = ContentResolver::new(source, &artifact.id, file_name);
        let target = PageTarget {
            container_id: resolved.container.id,
            page_name: file_name,
            skip_existing: options.skip_existing_pages,
        };
        let file_report = synchronizer.sync(target, &commits, &feed).await;
        info!(
            file = %file_name,
            outcome = ?file_report.outcome,
            created = file_report.created,
            updates = file_report.updates,
            unchanged = file_report.unchanged,
            "[MIGRATE] File finished"
        );
        report.files.push(file_report);
    }

    report
}
