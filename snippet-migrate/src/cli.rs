///
/// This module implements the full CLI interface for snippet-migrate: command
/// parsing, settings resolution, client wiring and the user-visible summary.
///
/// All migration logic (data model, replay engine, API clients) lives in the
/// [`snippet-migrate-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: run the `snippet-migrate` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`snippet-migrate-core`]: ../../snippet-migrate-core/
use crate::load_config::resolve_settings;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use snippet_migrate_core::document_api::DocumentApiClient;
use snippet_migrate_core::snippet_api::SnippetApiClient;
use snippet_migrate_core::synchronise::{synchronise, MigrationReport};
use snippet_migrate_core::transport::HttpTransport;
use std::path::PathBuf;

/// CLI for snippet-migrate: replay snippet history into a document store.
#[derive(Parser)]
#[clap(
    name = "snippet-migrate",
    version,
    about = "Migrate Bitbucket snippets (as books) and their files (as pages) to BookStack, with history"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate every snippet of the workspace, replaying each file's commits as page revisions
    Migrate(MigrateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Bitbucket username
    #[clap(long, env = "BB_USER")]
    pub bb_user: String,

    /// Bitbucket app password
    #[clap(long, env = "BB_APP_PASSWORD", hide_env_values = true)]
    pub bb_app_password: String,

    /// Bitbucket workspace ID (defaults to the username)
    #[clap(long, env = "BB_WORKSPACE")]
    pub bb_workspace: Option<String>,

    /// Base URL of the Bitbucket API
    #[clap(long)]
    pub bb_api_base: Option<String>,

    /// Base URL of the BookStack instance (e.g. https://bookstack.example.com)
    #[clap(long, env = "BS_URL")]
    pub bs_url: Option<String>,

    /// BookStack API token ID
    #[clap(long, env = "BS_TOKEN_ID")]
    pub bs_token_id: String,

    /// BookStack API token secret
    #[clap(long, env = "BS_TOKEN_SECRET", hide_env_values = true)]
    pub bs_token_secret: String,

    /// Skip snippets entirely if a book with the same title already exists
    #[clap(long)]
    pub skip_existing_books: bool,

    /// Skip files whose page already exists in the target book (prevents history update)
    #[clap(long)]
    pub skip_existing_pages: bool,

    /// Only process the snippet with this ID
    #[clap(long)]
    pub test_snippet_id: Option<String>,

    /// Put a provenance line naming the commit at the top of every page revision
    #[clap(long)]
    pub annotate_pages: bool,

    /// Per-request timeout in seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    /// Optional YAML file with non-secret settings
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Migrate(args) => {
            let settings = resolve_settings(&args)?;
            let config = &settings.migration;
            config.trace_loaded();
            tracing::info!(command = "migrate", workspace = %config.workspace, "Starting migration");

            let source = SnippetApiClient::new(
                HttpTransport::new(settings.source_credentials.clone(), config.request_timeout())?,
                config.source_api_base.clone(),
                config.workspace.clone(),
            );
            let store = DocumentApiClient::new(
                HttpTransport::new(
                    settings.destination_credentials.clone(),
                    config.request_timeout(),
                )?,
                config.destination_base_url.clone(),
            );

            match synchronise(&config.options, &source, &store).await {
                Ok(report) => {
                    tracing::info!(command = "migrate", "Migration complete");
                    print_report(&report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "migrate", error = %e, "Migration failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}

fn print_report(report: &MigrationReport) {
    println!("--- Migration Complete ---");
    for artifact in &report.artifacts {
        println!(
            "{} ({}): {:?}",
            artifact.title, artifact.artifact_id, artifact.outcome
        );
        for file in &artifact.files {
            println!(
                "  {}: {:?} (created: {}, updates: {}, unchanged: {}, failed updates: {})",
                file.file_name,
                file.outcome,
                file.created,
                file.updates,
                file.unchanged,
                file.failed_updates
            );
        }
    }
    println!(
        "Pages created: {}, page updates: {}, failed files: {}",
        report.pages_created(),
        report.page_updates(),
        report.failed_files()
    );
}
