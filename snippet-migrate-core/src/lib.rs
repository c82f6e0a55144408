#![doc = "snippet-migrate-core: incremental revision replication from a snippet store into a document store."]

//! This crate contains the migration engine, its data model and the clients
//! for the two remote systems. Argument parsing, credential handling and
//! process exit policy live in the `snippet-migrate` binary crate.
//!
//! # Usage
//! Build a [`transport::HttpTransport`] per remote, wrap them in
//! [`snippet_api::SnippetApiClient`] and [`document_api::DocumentApiClient`],
//! then call [`synchronise::synchronise`].

pub mod config;
pub mod container;
pub mod content;
pub mod contract;
pub mod document_api;
pub mod error;
pub mod history;
pub mod page_sync;
pub mod paginate;
pub mod snippet_api;
pub mod synchronise;
pub mod transport;
