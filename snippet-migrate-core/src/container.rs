//! Container resolution: lookup-before-create, keyed by exact name.
//!
//! Re-runs are safe only because an existing container with the artifact's
//! title is reused instead of created again. Matching is case-sensitive and
//! the first match in listing order wins when several containers share a
//! name. Under concurrent runs the find-then-create pair is a race.

use tracing::{error, info};

use crate::contract::{Container, DocumentStore};
use crate::error::{ApiError, ContainerCreateError};

/// A container plus whether it was already there before this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContainer {
    pub container: Container,
    pub existed: bool,
}

pub struct ContainerResolver<'a, D: ?Sized> {
    store: &'a D,
}

impl<'a, D> ContainerResolver<'a, D>
where
    D: DocumentStore + ?Sized,
{
    pub fn new(store: &'a D) -> Self {
        Self { store }
    }

    pub async fn find(&self, name: &str) -> Result<Option<Container>, ApiError> {
        let candidates = self.store.find_containers(name).await?;
        let found = candidates.into_iter().find(|c| c.name == name);
        match &found {
            Some(c) => info!(container_id = c.id, name, "Found existing container"),
            None => info!(name, "Container not found"),
        }
        Ok(found)
    }

    pub async fn get_or_create(&self, name: &str) -> Result<ResolvedContainer, ContainerCreateError> {
        let existing = self.find(name).await.map_err(|source| {
            error!(error = %source, name, "Container lookup failed");
            ContainerCreateError::Lookup {
                name: name.to_string(),
                source,
            }
        })?;
        if let Some(container) = existing {
            return Ok(ResolvedContainer {
                container,
                existed: true,
            });
        }

        let container = self.store.create_container(name).await.map_err(|source| {
            error!(error = %source, name, "Failed to create container");
            ContainerCreateError::Create {
                name: name.to_string(),
                source,
            }
        })?;
        info!(container_id = container.id, name, "Successfully created container");
        Ok(ResolvedContainer {
            container,
            existed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockDocumentStore;
    use mockall::predicate::eq;

    fn container(id: i64, name: &str) -> Container {
        Container {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn exact_match_is_case_sensitive_and_first_wins() {
        let mut store = MockDocumentStore::new();
        store.expect_find_containers().with(eq("Demo")).returning(|_| {
            Ok(vec![
                container(1, "demo"),
                container(2, "Demo"),
                container(3, "Demo"),
            ])
        });
        store.expect_create_container().never();

        let resolved = ContainerResolver::new(&store)
            .get_or_create("Demo")
            .await
            .expect("resolves");
        assert_eq!(resolved.container.id, 2);
        assert!(resolved.existed);
    }

    #[tokio::test]
    async fn creates_when_no_exact_match() {
        let mut store = MockDocumentStore::new();
        store
            .expect_find_containers()
            .returning(|_| Ok(vec![container(1, "Demo (copy)")]));
        store
            .expect_create_container()
            .with(eq("Demo"))
            .times(1)
            .returning(|name| Ok(container(8, name)));

        let resolved = ContainerResolver::new(&store)
            .get_or_create("Demo")
            .await
            .expect("resolves");
        assert_eq!(resolved, ResolvedContainer { container: container(8, "Demo"), existed: false });
    }

    #[tokio::test]
    async fn create_failure_is_reported() {
        let mut store = MockDocumentStore::new();
        store.expect_find_containers().returning(|_| Ok(vec![]));
        store.expect_create_container().returning(|_| {
            Err(ApiError::MissingField {
                url: "https://docs/api/books".into(),
                field: "id",
            })
        });

        let err = ContainerResolver::new(&store)
            .get_or_create("Demo")
            .await
            .expect_err("no usable id");
        assert!(matches!(err, ContainerCreateError::Create { .. }));
    }

    #[tokio::test]
    async fn lookup_failure_never_creates() {
        let mut store = MockDocumentStore::new();
        store.expect_find_containers().returning(|_| {
            Err(ApiError::Status {
                url: "https://docs/api/books".into(),
                status: 503,
                body: String::new(),
            })
        });
        store.expect_create_container().never();

        let err = ContainerResolver::new(&store)
            .get_or_create("Demo")
            .await
            .expect_err("lookup failed");
        assert!(matches!(err, ContainerCreateError::Lookup { .. }));
    }
}
