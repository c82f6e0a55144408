use serial_test::serial;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use snippet_migrate::cli::MigrateArgs;
use snippet_migrate::load_config::{load_config, resolve_settings};
use snippet_migrate_core::config::PageHeader;
use snippet_migrate_core::snippet_api::DEFAULT_API_BASE;
use snippet_migrate_core::transport::Credentials;

fn write_config(yaml: &str) -> NamedTempFile {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), yaml).expect("write temp config");
    config_file
}

fn args(config: Option<PathBuf>) -> MigrateArgs {
    MigrateArgs {
        bb_user: "ada".to_string(),
        bb_app_password: "app-pass".to_string(),
        bb_workspace: None,
        bb_api_base: None,
        bs_url: None,
        bs_token_id: "tid".to_string(),
        bs_token_secret: "tsecret".to_string(),
        skip_existing_books: false,
        skip_existing_pages: false,
        test_snippet_id: None,
        annotate_pages: false,
        timeout_secs: None,
        config,
    }
}

/// A full static config loads every section.
#[test]
#[serial]
fn test_load_config_reads_all_sections() {
    let config_file = write_config(
        r#"
source:
  api_base: "http://localhost:8000/2.0/"
  workspace: team
destination:
  base_url: "https://docs.example.com"
request_timeout_secs: 5
options:
  skip_existing_pages: true
  page_header: annotated
"#,
    );

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(
        config.source.api_base.as_deref(),
        Some("http://localhost:8000/2.0/")
    );
    assert_eq!(config.source.workspace.as_deref(), Some("team"));
    assert_eq!(
        config.destination.base_url.as_deref(),
        Some("https://docs.example.com")
    );
    assert_eq!(config.request_timeout_secs, Some(5));
    assert!(config.options.skip_existing_pages);
    assert!(!config.options.skip_existing_containers);
    assert_eq!(config.options.page_header, PageHeader::Annotated);
}

#[test]
#[serial]
fn test_load_config_empty_file_is_all_defaults() {
    let config_file = write_config("");
    let config = load_config(config_file.path()).expect("Empty config should load");
    assert!(config.source.workspace.is_none());
    assert!(config.destination.base_url.is_none());
    assert_eq!(config.options.page_header, PageHeader::Plain);
}

#[test]
#[serial]
fn test_load_config_invalid_yaml_fails() {
    let config_file = write_config("source: [unclosed");
    let result = load_config(config_file.path());
    assert!(result.is_err(), "Invalid YAML should fail");
    let msg = format!("{}", result.unwrap_err());
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Error message should mention parse/YAML failure, got: {}",
        msg
    );
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    let config_file = write_config("destination:\n  token_secret: oops\n");
    assert!(load_config(config_file.path()).is_err());
}

#[test]
#[serial]
fn test_load_config_missing_file_fails() {
    let result = load_config("/definitely/not/here.yaml");
    let msg = format!("{}", result.unwrap_err());
    assert!(msg.contains("read"), "got: {msg}");
}

#[test]
#[serial]
fn test_resolve_settings_without_file_uses_defaults() {
    let mut args = args(None);
    args.bs_url = Some("https://docs.example.com".to_string());

    let settings = resolve_settings(&args).expect("settings");

    assert_eq!(settings.migration.workspace, "ada");
    assert_eq!(settings.migration.source_api_base, DEFAULT_API_BASE);
    assert_eq!(settings.migration.destination_base_url, "https://docs.example.com");
    assert_eq!(settings.migration.request_timeout_secs, 30);
    assert_eq!(settings.migration.options.page_header, PageHeader::Plain);
    assert!(matches!(
        settings.source_credentials,
        Credentials::Basic { ref user, ref password } if user == "ada" && password == "app-pass"
    ));
    assert!(matches!(
        settings.destination_credentials,
        Credentials::Token { ref id, ref secret } if id == "tid" && secret == "tsecret"
    ));
}

#[test]
#[serial]
fn test_resolve_settings_flags_override_file() {
    let config_file = write_config(
        r#"
source:
  workspace: from-file
destination:
  base_url: "https://file.example.com"
request_timeout_secs: 5
options:
  only_artifact: file-snippet
"#,
    );
    let mut args = args(Some(config_file.path().to_path_buf()));
    args.bb_workspace = Some("from-flag".to_string());
    args.bs_url = Some("https://flag.example.com".to_string());
    args.timeout_secs = Some(9);
    args.test_snippet_id = Some("flag-snippet".to_string());
    args.skip_existing_books = true;
    args.annotate_pages = true;

    let settings = resolve_settings(&args).expect("settings");
    let migration = &settings.migration;

    assert_eq!(migration.workspace, "from-flag");
    assert_eq!(migration.destination_base_url, "https://flag.example.com");
    assert_eq!(migration.request_timeout_secs, 9);
    assert_eq!(migration.options.only_artifact.as_deref(), Some("flag-snippet"));
    assert!(migration.options.skip_existing_containers);
    assert_eq!(migration.options.page_header, PageHeader::Annotated);
}

#[test]
#[serial]
fn test_resolve_settings_file_fills_missing_flags() {
    let config_file = write_config(
        r#"
source:
  workspace: from-file
destination:
  base_url: "https://file.example.com"
options:
  skip_existing_pages: true
"#,
    );
    let settings =
        resolve_settings(&args(Some(config_file.path().to_path_buf()))).expect("settings");

    assert_eq!(settings.migration.workspace, "from-file");
    assert_eq!(
        settings.migration.destination_base_url,
        "https://file.example.com"
    );
    assert!(settings.migration.options.skip_existing_pages);
}

#[test]
#[serial]
fn test_resolve_settings_requires_destination() {
    let result = resolve_settings(&args(None));
    let msg = format!("{}", result.unwrap_err());
    assert!(msg.contains("destination"), "got: {msg}");
}
