/// `load_config` module: Loads the optional YAML config file and merges it with
/// command-line flags and environment secrets into the settings of one run.
///
/// This module is the only place where untrusted YAML is parsed and mapped to
/// the strongly-typed configuration of the core crate.
///
/// # Responsibilities
/// - Parse a user-supplied YAML file holding non-secret settings
/// - Overlay command-line flags (flags always win over file values)
/// - Take secrets from flags or environment only, never from the file
/// - Fail with a clear diagnostic before any network call when a required
///   setting is missing
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI
/// boundary.
use anyhow::{bail, Result};
use serde::Deserialize;
use snippet_migrate_core::config::{MigrationConfig, MigrationOptions, PageHeader};
use snippet_migrate_core::snippet_api::DEFAULT_API_BASE;
use snippet_migrate_core::transport::{Credentials, DEFAULT_TIMEOUT};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::cli::MigrateArgs;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub destination: DestinationSection,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub options: MigrationOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub api_base: Option<String>,
    pub workspace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationSection {
    pub base_url: Option<String>,
}

/// Everything a run needs: where to connect, how to authenticate, what to do.
#[derive(Debug)]
pub struct Settings {
    pub migration: MigrationConfig,
    pub source_credentials: Credentials,
    pub destination_credentials: Credentials,
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<Option<FileConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Merge file, flags and secrets into the settings of one run.
pub fn resolve_settings(args: &MigrateArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    let workspace = args
        .bb_workspace
        .clone()
        .or(file.source.workspace)
        .unwrap_or_else(|| args.bb_user.clone());

    let Some(destination_base_url) = args.bs_url.clone().or(file.destination.base_url) else {
        bail!("destination base URL is required (--bs-url, BS_URL or destination.base_url in --config)");
    };

    let mut options = file.options;
    options.skip_existing_containers |= args.skip_existing_books;
    options.skip_existing_pages |= args.skip_existing_pages;
    if args.test_snippet_id.is_some() {
        options.only_artifact = args.test_snippet_id.clone();
    }
    if args.annotate_pages {
        options.page_header = PageHeader::Annotated;
    }

    let migration = MigrationConfig {
        source_api_base: args
            .bb_api_base
            .clone()
            .or(file.source.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        workspace,
        destination_base_url,
        request_timeout_secs: args
            .timeout_secs
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT.as_secs()),
        options,
    };

    Ok(Settings {
        migration,
        source_credentials: Credentials::Basic {
            user: args.bb_user.clone(),
            password: args.bb_app_password.clone(),
        },
        destination_credentials: Credentials::Token {
            id: args.bs_token_id.clone(),
            secret: args.bs_token_secret.clone(),
        },
    })
}
