//! In-memory stand-ins for both remote systems.
//!
//! `FakeSource` serves a fixed snippet history; `FakeStore` behaves like a
//! document store (pages keep their body) and records every write call so
//! tests can assert on exact call sequences.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use snippet_migrate_core::contract::{
    Artifact, ArtifactSource, ArtifactSummary, Commit, Container, DocumentStore, Page,
};
use snippet_migrate_core::error::ApiError;

pub fn commit(hash: &str, message: &str) -> Commit {
    Commit {
        hash: hash.to_string(),
        date: "2024-01-01T00:00:00Z".to_string(),
        author: "Ada <ada@example.com>".to_string(),
        message: message.to_string(),
        synthetic: false,
    }
}

pub fn server_error(url: &str) -> ApiError {
    ApiError::Status {
        url: url.to_string(),
        status: 500,
        body: "internal".to_string(),
    }
}

/// A source where each file has an explicit content per commit hash.
#[derive(Default)]
pub struct FakeSource {
    pub artifacts: Vec<Artifact>,
    /// Oldest-first history per artifact id; served newest-first like the real API.
    pub history: HashMap<String, Vec<Commit>>,
    /// (artifact, hash, file) -> bytes. Missing keys answer "not found".
    pub contents: HashMap<(String, String, String), Vec<u8>>,
    /// (artifact, hash, file) triples that answer with a server error.
    pub broken_contents: HashSet<(String, String, String)>,
    pub fail_listing: bool,
    pub fail_history: HashSet<String>,
    pub fetches: Mutex<Vec<(String, String, String)>>,
}

impl FakeSource {
    pub fn add_artifact(&mut self, id: &str, title: &str, files: &[&str]) {
        self.artifacts.push(Artifact {
            id: id.to_string(),
            title: title.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            updated_on: Some("2024-06-01T12:00:00Z".to_string()),
        });
    }

    /// Append a commit (oldest first) with the given per-file contents;
    /// files not mentioned do not exist at that commit.
    pub fn add_commit(&mut self, artifact_id: &str, hash: &str, files: &[(&str, &str)]) {
        self.history
            .entry(artifact_id.to_string())
            .or_default()
            .push(commit(hash, &format!("change {hash}")));
        for (file, text) in files {
            self.contents.insert(
                (artifact_id.to_string(), hash.to_string(), file.to_string()),
                text.as_bytes().to_vec(),
            );
        }
    }

    pub fn fetched_hashes(&self, file: &str) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, _, f)| f == file)
            .map(|(_, h, _)| h.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactSource for FakeSource {
    async fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>, ApiError> {
        if self.fail_listing {
            return Err(server_error("https://src/snippets/team"));
        }
        Ok(self
            .artifacts
            .iter()
            .map(|a| ArtifactSummary {
                id: a.id.clone(),
                title: a.title.clone(),
            })
            .collect())
    }

    async fn artifact(&self, artifact_id: &str) -> Result<Artifact, ApiError> {
        self.artifacts
            .iter()
            .find(|a| a.id == artifact_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                url: format!("https://src/snippets/team/{artifact_id}"),
                status: 404,
                body: String::new(),
            })
    }

    async fn commits(&self, artifact_id: &str) -> Result<Vec<Commit>, ApiError> {
        if self.fail_history.contains(artifact_id) {
            return Err(server_error("https://src/commits"));
        }
        let mut newest_first = self.history.get(artifact_id).cloned().unwrap_or_default();
        newest_first.reverse();
        Ok(newest_first)
    }

    async fn file_at(
        &self,
        artifact_id: &str,
        commit_hash: &str,
        file_name: &str,
    ) -> Result<Option<Vec<u8>>, ApiError> {
        let key = (
            artifact_id.to_string(),
            commit_hash.to_string(),
            file_name.to_string(),
        );
        self.fetches.lock().unwrap().push(key.clone());
        if self.broken_contents.contains(&key) {
            return Err(server_error("https://src/files"));
        }
        Ok(self.contents.get(&key).cloned())
    }
}

/// A destination write, as observed by the fake store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateContainer { name: String },
    CreatePage { container_id: i64, name: String, body: String },
    UpdatePage { page_id: i64, body: String, summary: String },
}

#[derive(Debug, Clone)]
pub struct StoredPage {
    pub id: i64,
    pub container_id: i64,
    pub name: String,
    pub body: String,
    pub revisions: usize,
}

#[derive(Default)]
pub(crate) struct StoreState {
    next_id: i64,
    containers: Vec<Container>,
    pages: Vec<StoredPage>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeStore {
    pub(crate) state: Mutex<StoreState>,
    pub fail_container_create: bool,
    /// Page names whose create call fails.
    pub fail_page_create: HashSet<String>,
    /// Bodies whose update call fails.
    pub fail_update_with_body: HashSet<String>,
    pub fail_page_lookup: bool,
}

impl FakeStore {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn containers(&self) -> Vec<Container> {
        self.state.lock().unwrap().containers.clone()
    }

    pub fn pages(&self) -> Vec<StoredPage> {
        self.state.lock().unwrap().pages.clone()
    }

    pub fn seed_container(&self, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.containers.push(Container {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn seed_page(&self, container_id: i64, name: &str, body: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.pages.push(StoredPage {
            id,
            container_id,
            name: name.to_string(),
            body: body.to_string(),
            revisions: 1,
        });
        id
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn find_containers(&self, name: &str) -> Result<Vec<Container>, ApiError> {
        // Fuzzy like a real name filter: substring match.
        Ok(self
            .state
            .lock()
            .unwrap()
            .containers
            .iter()
            .filter(|c| c.name.contains(name))
            .cloned()
            .collect())
    }

    async fn create_container(&self, name: &str) -> Result<Container, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateContainer {
            name: name.to_string(),
        });
        if self.fail_container_create {
            return Err(ApiError::MissingField {
                url: "https://docs/api/books".to_string(),
                field: "id",
            });
        }
        state.next_id += 1;
        let container = Container {
            id: state.next_id,
            name: name.to_string(),
        };
        state.containers.push(container.clone());
        Ok(container)
    }

    async fn find_page(&self, container_id: i64, name: &str) -> Result<Option<Page>, ApiError> {
        if self.fail_page_lookup {
            return Err(server_error("https://docs/api/pages"));
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .pages
            .iter()
            .find(|p| p.container_id == container_id && p.name == name)
            .map(|p| Page {
                id: p.id,
                name: p.name.clone(),
            }))
    }

    async fn page_body(&self, page_id: i64) -> Result<Option<String>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .map(|p| p.body.clone()))
    }

    async fn create_page(
        &self,
        container_id: i64,
        name: &str,
        body: &str,
    ) -> Result<Page, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreatePage {
            container_id,
            name: name.to_string(),
            body: body.to_string(),
        });
        if self.fail_page_create.contains(name) {
            return Err(server_error("https://docs/api/pages"));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.pages.push(StoredPage {
            id,
            container_id,
            name: name.to_string(),
            body: body.to_string(),
            revisions: 1,
        });
        Ok(Page {
            id,
            name: name.to_string(),
        })
    }

    async fn update_page(
        &self,
        page_id: i64,
        body: &str,
        summary: &str,
    ) -> Result<Page, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdatePage {
            page_id,
            body: body.to_string(),
            summary: summary.to_string(),
        });
        if self.fail_update_with_body.contains(body) {
            return Err(server_error(&format!("https://docs/api/pages/{page_id}")));
        }
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| server_error("https://docs/api/pages"))?;
        page.body = body.to_string();
        page.revisions += 1;
        Ok(Page {
            id: page.id,
            name: page.name.clone(),
        })
    }
}
