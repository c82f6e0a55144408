//! Client for the destination document API (BookStack books and pages).
//!
//! Books are the containers, pages are the documents. Every page update adds
//! a revision on the BookStack side, which is what replay relies on.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::contract::{Container, DocumentStore, Page};
use crate::error::ApiError;
use crate::paginate::{find_in_offset_pages, OFFSET_ITEMS_KEY};
use crate::transport::JsonTransport;

pub const CONTAINER_DESCRIPTION: &str = "Imported from Bitbucket Snippet";
pub const CONTAINER_TAG: &str = "Bitbucket Snippet Import";
pub const PAGE_TAG: &str = "Snippet File";

pub struct DocumentApiClient<T> {
    transport: T,
    base_url: String,
}

impl<T: JsonTransport> DocumentApiClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

fn numeric_id(value: &Value, url: &str) -> Result<i64, ApiError> {
    value
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::MissingField {
            url: url.to_string(),
            field: "id",
        })
}

fn name_of(value: &Value) -> &str {
    value.get("name").and_then(Value::as_str).unwrap_or_default()
}

#[async_trait]
impl<T: JsonTransport> DocumentStore for DocumentApiClient<T> {
    async fn find_containers(&self, name: &str) -> Result<Vec<Container>, ApiError> {
        let url = format!("{}?filter[name]={}", self.api("books"), urlencoding::encode(name));
        info!(name, "Searching for book");
        let response = self.transport.get_json(&url).await?;

        let Some(data) = response.get(OFFSET_ITEMS_KEY).and_then(Value::as_array) else {
            warn!(url = %url, "Book listing without data, treating as empty");
            return Ok(Vec::new());
        };
        Ok(data
            .iter()
            .filter_map(|book| {
                let id = book.get("id").and_then(Value::as_i64)?;
                Some(Container {
                    id,
                    name: name_of(book).to_string(),
                })
            })
            .collect())
    }

    async fn create_container(&self, name: &str) -> Result<Container, ApiError> {
        let url = self.api("books");
        let payload = json!({
            "name": name,
            "description": CONTAINER_DESCRIPTION,
            "tags": [{"name": CONTAINER_TAG, "value": name}],
        });
        info!(name, "Creating new book");
        let created = self.transport.post_json(&url, &payload).await?;
        Ok(Container {
            id: numeric_id(&created, &url)?,
            name: name.to_string(),
        })
    }

    async fn find_page(&self, container_id: i64, name: &str) -> Result<Option<Page>, ApiError> {
        let url = format!("{}?filter[book_id]={container_id}", self.api("pages"));
        info!(container_id, page_name = name, "Searching for page");
        let found = find_in_offset_pages(&self.transport, &url, |page| {
            name_of(page) == name
                && page.get("book_id").and_then(Value::as_i64) == Some(container_id)
        })
        .await?;

        match found {
            Some(page) => Ok(Some(Page {
                id: numeric_id(&page, &url)?,
                name: name.to_string(),
            })),
            None => Ok(None),
        }
    }

    async fn page_body(&self, page_id: i64) -> Result<Option<String>, ApiError> {
        let url = self.api(&format!("pages/{page_id}"));
        let page = self.transport.get_json(&url).await?;
        Ok(page
            .get("markdown")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn create_page(
        &self,
        container_id: i64,
        name: &str,
        body: &str,
    ) -> Result<Page, ApiError> {
        let url = self.api("pages");
        let payload = json!({
            "book_id": container_id,
            "name": name,
            "markdown": body,
            "tags": [{"name": PAGE_TAG, "value": name}],
        });
        let created = self.transport.post_json(&url, &payload).await?;
        Ok(Page {
            id: numeric_id(&created, &url)?,
            name: name.to_string(),
        })
    }

    async fn update_page(
        &self,
        page_id: i64,
        body: &str,
        summary: &str,
    ) -> Result<Page, ApiError> {
        let url = self.api(&format!("pages/{page_id}"));
        let payload = json!({
            "markdown": body,
            "summary": format!("Update from Bitbucket ({summary})"),
        });
        let updated = self.transport.put_json(&url, &payload).await?;
        Ok(Page {
            id: updated.get("id").and_then(Value::as_i64).unwrap_or(page_id),
            name: name_of(&updated).to_string(),
        })
    }
}
