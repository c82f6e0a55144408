use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// How the provenance of a revision shows up in the page body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageHeader {
    /// Blank separator only; identical content gives identical payloads.
    #[default]
    Plain,
    /// Quoted provenance line naming the commit above the content.
    Annotated,
}

/// Knobs that change what a run does, not where it connects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationOptions {
    /// Skip an artifact entirely when its container already exists.
    pub skip_existing_containers: bool,
    /// Skip a file entirely when its page already exists.
    pub skip_existing_pages: bool,
    /// Restrict the run to this one artifact id.
    pub only_artifact: Option<String>,
    pub page_header: PageHeader,
}

/// Non-secret settings for one run, threaded through constructors.
///
/// Assembled by the binary from flags and the optional config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub source_api_base: String,
    pub workspace: String,
    pub destination_base_url: String,
    pub request_timeout_secs: u64,
    pub options: MigrationOptions,
}

impl MigrationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            source_api_base = %self.source_api_base,
            workspace = %self.workspace,
            destination = %self.destination_base_url,
            only_artifact = self.options.only_artifact.as_deref().unwrap_or("<all>"),
            "Loaded MigrationConfig"
        );
        debug!(?self, "MigrationConfig loaded (full debug)");
    }
}
