//! Page synchronisation: fold one file's ordered revisions into page writes.
//!
//! For every destination page the engine keeps a [`SyncCursor`], a small
//! state machine:
//!
//! ```text
//! Unresolved ──find_page──▶ ResolvedExisting ──update──▶ Materialized ──▶ Synced
//!            └────────────▶ ResolvedAbsent  ──create──▶ Materialized ──▶ Synced
//! ```
//!
//! Each revision is planned against the cursor exactly once:
//!
//! - absent / unfetchable content: no call, no state change;
//! - no page yet: create. The creating revision never also issues an update;
//! - page known: compare the full payload (provenance header included) with
//!   the previously attempted payload and update only when it differs.
//!
//! The previous payload is recorded whether the write succeeded, failed or
//! was skipped, so each comparison is against the latest attempted content.
//! A failed create ends the file's replay; a failed update does not.

use std::ops::ControlFlow;

use tracing::{debug, error, info, warn};

use crate::config::PageHeader;
use crate::contract::{Commit, DocumentStore, RevisionContent, RevisionFeed};

/// Build the body written to the destination for `content` at `commit`.
pub fn compose_payload(header: PageHeader, commit: &Commit, content: &str) -> String {
    match header {
        PageHeader::Plain => format!("\n\n{content}"),
        PageHeader::Annotated => format!("> {}\n\n{content}", commit.provenance()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// Page existence not yet checked.
    Unresolved,
    /// A page with the exact name already exists.
    ResolvedExisting { page_id: i64 },
    /// Confirmed that no such page exists.
    ResolvedAbsent,
    /// First content written in this run, by create or by update.
    Materialized { page_id: i64 },
    /// Steady state: further revisions update or skip.
    Synced { page_id: i64 },
}

/// What the cursor wants done with one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePlan {
    Create,
    Update { page_id: i64 },
    Unchanged,
    /// The cursor was never resolved; nothing may be written.
    Blocked,
}

/// How an attempted update ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    Unchanged,
    Failed,
}

/// Per-page replay state. Lives for one file's replay and is then dropped.
#[derive(Debug, Clone)]
pub struct SyncCursor {
    state: PageState,
    created_this_run: bool,
    previous_payload: Option<String>,
}

impl Default for SyncCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncCursor {
    pub fn new() -> Self {
        Self {
            state: PageState::Unresolved,
            created_this_run: false,
            previous_payload: None,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn created_this_run(&self) -> bool {
        self.created_this_run
    }

    pub fn page_id(&self) -> Option<i64> {
        match self.state {
            PageState::ResolvedExisting { page_id }
            | PageState::Materialized { page_id }
            | PageState::Synced { page_id } => Some(page_id),
            PageState::Unresolved | PageState::ResolvedAbsent => None,
        }
    }

    /// Record the result of the existence check. Only valid once.
    pub fn resolve(&mut self, existing_page: Option<i64>) {
        if self.state != PageState::Unresolved {
            warn!(state = ?self.state, "Ignoring repeated page resolution");
            return;
        }
        self.state = match existing_page {
            Some(page_id) => PageState::ResolvedExisting { page_id },
            None => PageState::ResolvedAbsent,
        };
    }

    /// Use `payload` as the comparison baseline for the next revision.
    pub fn seed_previous(&mut self, payload: String) {
        self.previous_payload = Some(payload);
    }

    pub fn plan(&self, payload: &str) -> WritePlan {
        match self.state {
            PageState::Unresolved => WritePlan::Blocked,
            PageState::ResolvedAbsent => WritePlan::Create,
            PageState::ResolvedExisting { page_id }
            | PageState::Materialized { page_id }
            | PageState::Synced { page_id } => {
                if self.previous_payload.as_deref() == Some(payload) {
                    WritePlan::Unchanged
                } else {
                    WritePlan::Update { page_id }
                }
            }
        }
    }

    /// The page was created holding `payload`.
    pub fn record_created(&mut self, page_id: i64, payload: String) {
        self.state = PageState::Materialized { page_id };
        self.created_this_run = true;
        self.previous_payload = Some(payload);
    }

    /// Record a planned update (or skip) for `payload`, whatever its outcome.
    pub fn record(&mut self, payload: String, result: WriteResult) {
        self.state = match (&self.state, result) {
            (PageState::ResolvedExisting { page_id }, WriteResult::Written) => {
                PageState::Materialized { page_id: *page_id }
            }
            (PageState::ResolvedExisting { page_id }, WriteResult::Unchanged) => {
                PageState::Synced { page_id: *page_id }
            }
            (PageState::Materialized { page_id }, _) => PageState::Synced { page_id: *page_id },
            (state, _) => state.clone(),
        };
        self.previous_payload = Some(payload);
    }
}

/// How one file's replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The page exists and reflects the replayed history.
    Synced,
    /// The page existed and skipping existing pages was requested.
    SkippedExisting,
    /// No revision had content, so no page was created.
    NotCreated,
    /// Creating the page failed; remaining revisions were not attempted.
    CreateFailed,
    /// The page existence check failed; nothing was written.
    LookupFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub page_id: Option<i64>,
    pub outcome: FileOutcome,
    pub created: bool,
    pub updates: usize,
    pub unchanged: usize,
    pub absent: usize,
    pub unavailable: usize,
    pub failed_updates: usize,
}

impl FileReport {
    fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            page_id: None,
            outcome: FileOutcome::NotCreated,
            created: false,
            updates: 0,
            unchanged: 0,
            absent: 0,
            unavailable: 0,
            failed_updates: 0,
        }
    }
}

/// Where a file's revisions go.
#[derive(Debug, Clone, Copy)]
pub struct PageTarget<'a> {
    pub container_id: i64,
    pub page_name: &'a str,
    pub skip_existing: bool,
}

pub struct PageSynchronizer<'a, D: ?Sized> {
    store: &'a D,
    header: PageHeader,
}

impl<'a, D> PageSynchronizer<'a, D>
where
    D: DocumentStore + ?Sized,
{
    pub fn new(store: &'a D, header: PageHeader) -> Self {
        Self { store, header }
    }

    /// Replay `commits` (oldest first) onto the page named by `target`.
    pub async fn sync<F>(&self, target: PageTarget<'_>, commits: &[Commit], feed: &F) -> FileReport
    where
        F: RevisionFeed + ?Sized,
    {
        let mut report = FileReport::new(target.page_name);
        let mut cursor = SyncCursor::new();

        let existing = match self
            .store
            .find_page(target.container_id, target.page_name)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                error!(error = %e, page_name = target.page_name, "[MIGRATE][PAGE] Page lookup failed, skipping file");
                report.outcome = FileOutcome::LookupFailed;
                return report;
            }
        };
        cursor.resolve(existing.as_ref().map(|p| p.id));

        if let Some(page) = existing {
            report.page_id = Some(page.id);
            if target.skip_existing {
                info!(page_id = page.id, page_name = target.page_name, "[MIGRATE][PAGE] Page exists, skipping as requested");
                report.outcome = FileOutcome::SkippedExisting;
                return report;
            }
            info!(page_id = page.id, page_name = target.page_name, "[MIGRATE][PAGE] Found existing page, will update with history");
            self.replay_existing(&target, &mut cursor, &mut report, page.id, commits, feed)
                .await;
        } else {
            for (i, commit) in commits.iter().enumerate() {
                debug!(step = i + 1, total = commits.len(), commit = commit.short_hash(), "[MIGRATE][PAGE] Applying commit");
                let content = feed.content_at(commit).await;
                if self
                    .apply(&target, &mut cursor, &mut report, commit, content)
                    .await
                    .is_break()
                {
                    break;
                }
            }
        }

        self.finish(&cursor, &mut report);
        report
    }

    /// Existing pages may already hold part of the history from an earlier
    /// run: skip every revision up to the last one whose payload equals the
    /// page's current body, then continue from there.
    ///
    /// Every revision's content is fetched and held before the first write,
    /// so memory grows with the length of the file's history.
    async fn replay_existing<F>(
        &self,
        target: &PageTarget<'_>,
        cursor: &mut SyncCursor,
        report: &mut FileReport,
        page_id: i64,
        commits: &[Commit],
        feed: &F,
    ) where
        F: RevisionFeed + ?Sized,
    {
        let mut revisions = Vec::with_capacity(commits.len());
        for commit in commits {
            revisions.push((commit, feed.content_at(commit).await));
        }

        let mut resume_at = 0;
        match self.store.page_body(page_id).await {
            Ok(Some(body)) => {
                if let Some(last) = revisions.iter().rposition(|(commit, content)| {
                    matches!(content, RevisionContent::Present(text)
                        if compose_payload(self.header, commit, text) == body)
                }) {
                    resume_at = last + 1;
                    for (_, content) in &revisions[..resume_at] {
                        match content {
                            RevisionContent::Present(_) => report.unchanged += 1,
                            RevisionContent::Absent => report.absent += 1,
                            RevisionContent::Unavailable => report.unavailable += 1,
                        }
                    }
                    info!(page_id, already_applied = resume_at, "[MIGRATE][PAGE] Page already holds part of the history");
                }
                cursor.seed_previous(body);
            }
            Ok(None) => debug!(page_id, "Page body not exposed, replaying full history"),
            Err(e) => warn!(error = %e, page_id, "Could not read page body, replaying full history"),
        }

        for (commit, content) in revisions.into_iter().skip(resume_at) {
            if self
                .apply(target, cursor, report, commit, content)
                .await
                .is_break()
            {
                break;
            }
        }
    }

    async fn apply(
        &self,
        target: &PageTarget<'_>,
        cursor: &mut SyncCursor,
        report: &mut FileReport,
        commit: &Commit,
        content: RevisionContent,
    ) -> ControlFlow<()> {
        let text = match content {
            RevisionContent::Present(text) => text,
            RevisionContent::Absent => {
                info!(commit = commit.short_hash(), "[MIGRATE][PAGE] Skipping revision, file not present");
                report.absent += 1;
                return ControlFlow::Continue(());
            }
            RevisionContent::Unavailable => {
                warn!(commit = commit.short_hash(), "[MIGRATE][PAGE] Skipping revision, content not retrieved");
                report.unavailable += 1;
                return ControlFlow::Continue(());
            }
        };
        let payload = compose_payload(self.header, commit, &text);

        match cursor.plan(&payload) {
            WritePlan::Create => {
                info!(page_name = target.page_name, container_id = target.container_id, provenance = %commit.provenance(), "[MIGRATE][PAGE] Creating page");
                match self
                    .store
                    .create_page(target.container_id, target.page_name, &payload)
                    .await
                {
                    Ok(page) => {
                        info!(page_id = page.id, page_name = target.page_name, "[MIGRATE][PAGE] Successfully created page");
                        report.created = true;
                        report.page_id = Some(page.id);
                        cursor.record_created(page.id, payload);
                    }
                    Err(e) => {
                        error!(error = %e, page_name = target.page_name, "[MIGRATE][PAGE][ERROR] Failed to create page, skipping remaining commits for this file");
                        report.outcome = FileOutcome::CreateFailed;
                        return ControlFlow::Break(());
                    }
                }
            }
            WritePlan::Update { page_id } => {
                let provenance = commit.provenance();
                info!(page_id, provenance = %provenance, "[MIGRATE][PAGE] Updating page");
                match self.store.update_page(page_id, &payload, &provenance).await {
                    Ok(_) => {
                        report.updates += 1;
                        cursor.record(payload, WriteResult::Written);
                    }
                    Err(e) => {
                        error!(error = %e, page_id, commit = commit.short_hash(), "[MIGRATE][PAGE][ERROR] Failed to update page, continuing");
                        report.failed_updates += 1;
                        cursor.record(payload, WriteResult::Failed);
                    }
                }
            }
            WritePlan::Unchanged => {
                info!(page_id = ?cursor.page_id(), commit = commit.short_hash(), "[MIGRATE][PAGE] Content did not change, skipping");
                report.unchanged += 1;
                cursor.record(payload, WriteResult::Unchanged);
            }
            WritePlan::Blocked => {
                error!(page_name = target.page_name, "[MIGRATE][PAGE][ERROR] Page existence never resolved");
                report.outcome = FileOutcome::LookupFailed;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn finish(&self, cursor: &SyncCursor, report: &mut FileReport) {
        if matches!(
            report.outcome,
            FileOutcome::CreateFailed | FileOutcome::LookupFailed
        ) {
            return;
        }
        match cursor.page_id() {
            Some(page_id) => {
                report.page_id = Some(page_id);
                report.outcome = FileOutcome::Synced;
            }
            None => {
                warn!(file = %report.file_name, "[MIGRATE][PAGE] No content could be retrieved from any commit, page was not created");
                report.outcome = FileOutcome::NotCreated;
            }
        }
    }
}
