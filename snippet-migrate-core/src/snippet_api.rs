//! Client for the source collection API (Bitbucket snippets).
//!
//! Implements [`ArtifactSource`] on top of any [`JsonTransport`]. Listing
//! endpoints are cursor-paged and walked with [`collect_cursor_pages`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::contract::{Artifact, ArtifactSource, ArtifactSummary, Commit};
use crate::error::ApiError;
use crate::paginate::{collect_cursor_pages, CURSOR_ITEMS_KEY};
use crate::transport::JsonTransport;

pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0/";

pub struct SnippetApiClient<T> {
    transport: T,
    api_base: String,
    workspace: String,
}

impl<T: JsonTransport> SnippetApiClient<T> {
    pub fn new(transport: T, api_base: impl Into<String>, workspace: impl Into<String>) -> Self {
        let mut api_base = api_base.into();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        Self {
            transport,
            api_base,
            workspace: workspace.into(),
        }
    }

    fn snippets_url(&self) -> String {
        format!(
            "{}snippets/{}",
            self.api_base,
            urlencoding::encode(&self.workspace)
        )
    }

    fn snippet_url(&self, artifact_id: &str) -> String {
        format!("{}/{}", self.snippets_url(), urlencoding::encode(artifact_id))
    }
}

/// Snippet ids arrive as strings or numbers depending on the endpoint.
fn id_of(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn title_of(value: &Value, id: &str) -> String {
    value
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Untitled Snippet {id}"))
}

fn parse_commit(value: &Value) -> Option<Commit> {
    let hash = value.get("hash").and_then(Value::as_str)?.to_string();
    let text = |key: &str, default: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    Some(Commit {
        hash,
        date: text("date", "Unknown Date"),
        message: text("message", "No message"),
        author: value
            .get("author")
            .and_then(|a| a.get("raw"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown author")
            .to_string(),
        synthetic: false,
    })
}

#[async_trait]
impl<T: JsonTransport> ArtifactSource for SnippetApiClient<T> {
    async fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>, ApiError> {
        let url = self.snippets_url();
        info!(url = %url, "Fetching all snippets");
        let raw = collect_cursor_pages(&self.transport, &url, CURSOR_ITEMS_KEY).await?;

        let mut artifacts = Vec::with_capacity(raw.len());
        for entry in &raw {
            match id_of(entry) {
                Some(id) => artifacts.push(ArtifactSummary {
                    title: title_of(entry, &id),
                    id,
                }),
                None => warn!(entry = %entry, "Invalid snippet data encountered, skipping"),
            }
        }
        info!(count = artifacts.len(), "Found snippets");
        Ok(artifacts)
    }

    async fn artifact(&self, artifact_id: &str) -> Result<Artifact, ApiError> {
        let url = self.snippet_url(artifact_id);
        info!(url = %url, artifact_id, "Fetching snippet details");
        let details = self.transport.get_json(&url).await?;

        let files = details
            .get("files")
            .and_then(Value::as_object)
            .ok_or(ApiError::MissingField {
                url: url.clone(),
                field: "files",
            })?
            .keys()
            .cloned()
            .collect();
        let id = id_of(&details).unwrap_or_else(|| artifact_id.to_string());

        Ok(Artifact {
            title: title_of(&details, &id),
            id,
            files,
            updated_on: details
                .get("updated_on")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn commits(&self, artifact_id: &str) -> Result<Vec<Commit>, ApiError> {
        let url = format!("{}/commits", self.snippet_url(artifact_id));
        info!(url = %url, artifact_id, "Fetching snippet commits");
        let raw = collect_cursor_pages(&self.transport, &url, CURSOR_ITEMS_KEY).await?;

        let commits: Vec<Commit> = raw
            .iter()
            .filter_map(|entry| {
                let commit = parse_commit(entry);
                if commit.is_none() {
                    warn!(artifact_id, entry = %entry, "Commit without hash, skipping");
                }
                commit
            })
            .collect();
        info!(artifact_id, count = commits.len(), "Found commits");
        Ok(commits)
    }

    async fn file_at(
        &self,
        artifact_id: &str,
        commit_hash: &str,
        file_name: &str,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        let url = format!(
            "{}/{}/files/{}",
            self.snippet_url(artifact_id),
            urlencoding::encode(commit_hash),
            urlencoding::encode(file_name)
        );
        self.transport.get_raw(&url).await
    }
}
