// crates/mamacare-cache-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, store resolution, and commands.
// Purpose: Ensure CLI inputs are validated and commands reach the cache file.
// Dependencies: mamacare-cache-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises the CLI helpers and command handlers against temporary cache
//! files. CLI inputs are untrusted; malformed ids and payloads must be
//! rejected before storage is touched.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mamacare_cache_core::CacheEntrySummary;
use mamacare_cache_core::ProfileCacheStore;
use mamacare_cache_core::Timestamp;
use mamacare_cache_core::UserId;
use mamacare_cache_sqlite::SqliteCacheConfig;
use mamacare_cache_sqlite::SqliteProfileCache;
use tempfile::TempDir;

use super::Cli;
use super::ClearCommand;
use super::Commands;
use super::ListOutput;
use super::OutputFormat;
use super::PutCommand;
use super::StoreLocationArgs;
use super::command_clear;
use super::command_put;
use super::parse_attributes;
use super::parse_user_id;
use super::render_list_text;
use super::resolve_cache_config;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_location(path: PathBuf) -> StoreLocationArgs {
    StoreLocationArgs {
        config: None,
        store_path: Some(path),
    }
}

fn temp_store_path() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cache.sqlite");
    (temp, path)
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parse_user_id_rejects_empty_and_oversized() {
    assert!(parse_user_id("").is_err());
    assert!(parse_user_id(&"u".repeat(300)).is_err());
    assert_eq!(parse_user_id("user-a").unwrap(), UserId::new("user-a"));
}

#[test]
fn parse_attributes_requires_json_object() {
    let attrs = parse_attributes("--profile", r#"{"displayName":"Ama"}"#).unwrap();
    assert_eq!(attrs.get("displayName").and_then(|value| value.as_str()), Some("Ama"));

    let err = parse_attributes("--profile", "[1,2]").unwrap_err();
    assert!(err.to_string().contains("--profile must be a JSON object"));
    let err = parse_attributes("--user", "{oops").unwrap_err();
    assert!(err.to_string().contains("--user is not valid JSON"));
}

#[test]
fn cli_parses_put_with_store_path() {
    let cli = Cli::try_parse_from([
        "mamacare-cache",
        "put",
        "--user-id",
        "user-a",
        "--profile",
        "{}",
        "--store-path",
        "/tmp/cache.sqlite",
    ])
    .unwrap();
    let Commands::Put(command) = cli.command else {
        panic!("expected put command");
    };
    assert_eq!(command.user_id, "user-a");
    assert_eq!(command.user, None);
    assert_eq!(command.location.store_path, Some(PathBuf::from("/tmp/cache.sqlite")));
}

#[test]
fn cli_list_defaults_to_json() {
    let cli = Cli::try_parse_from(["mamacare-cache", "list", "--store-path", "x.sqlite"]).unwrap();
    let Commands::List(command) = cli.command else {
        panic!("expected list command");
    };
    assert_eq!(command.format, OutputFormat::Json);
}

// ============================================================================
// SECTION: Store Resolution
// ============================================================================

#[test]
fn store_path_without_config_uses_defaults() {
    let config = resolve_cache_config(&store_location(PathBuf::from("/tmp/a.sqlite"))).unwrap();
    let store = config.store_config().unwrap();
    assert_eq!(store.path, PathBuf::from("/tmp/a.sqlite"));
    assert_eq!(store.busy_timeout_ms, SqliteCacheConfig::for_path("x").busy_timeout_ms);
}

#[test]
fn store_path_overrides_config_location() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("mamacare-cache.toml");
    std::fs::write(&config_path, "[store]\ndirectory = \"./data\"\nbusy_timeout_ms = 250\n")
        .unwrap();
    let location = StoreLocationArgs {
        config: Some(config_path),
        store_path: Some(PathBuf::from("/tmp/b.sqlite")),
    };
    let store = resolve_cache_config(&location).unwrap().store_config().unwrap();
    assert_eq!(store.path, PathBuf::from("/tmp/b.sqlite"));
    assert_eq!(store.busy_timeout_ms, 250);
}

#[test]
fn missing_config_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let location = StoreLocationArgs {
        config: Some(temp.path().join("absent.toml")),
        store_path: None,
    };
    let err = resolve_cache_config(&location).unwrap_err();
    assert!(err.to_string().contains("failed to load config"));
}

// ============================================================================
// SECTION: Output
// ============================================================================

#[test]
fn render_list_text_handles_empty_and_entries() {
    let empty = ListOutput {
        entries: Vec::new(),
    };
    assert!(render_list_text(&empty).contains("(none)"));

    let output = ListOutput {
        entries: vec![CacheEntrySummary {
            id: UserId::new("user-a"),
            updated_at: Timestamp::from_unix_millis(42),
            has_user_data: true,
            profile_bytes: 10,
            user_bytes: 5,
        }],
    };
    let text = render_list_text(&output);
    assert!(text.contains("user-a updated_at=42 profile_bytes=10 user_bytes=5 session"));
}

// ============================================================================
// SECTION: Commands
// ============================================================================

#[tokio::test]
async fn put_then_clear_round_trips_through_file() {
    let (_temp, path) = temp_store_path();
    let put = PutCommand {
        user_id: "user-a".to_string(),
        profile: r#"{"displayName":"Ama"}"#.to_string(),
        user: Some(r#"{"accessToken":"t1"}"#.to_string()),
        location: store_location(path.clone()),
    };
    assert_eq!(command_put(put).await.unwrap(), ExitCode::SUCCESS);

    let partial = PutCommand {
        user_id: "user-a".to_string(),
        profile: r#"{"displayName":"Ama K."}"#.to_string(),
        user: None,
        location: store_location(path.clone()),
    };
    command_put(partial).await.unwrap();

    let store = SqliteProfileCache::new(SqliteCacheConfig::for_path(&path));
    let record = store.get(&UserId::new("user-a")).unwrap().expect("record");
    assert_eq!(record.profile_data.get("displayName").and_then(|v| v.as_str()), Some("Ama K."));
    assert!(record.user_data.is_some());

    let clear = ClearCommand {
        location: store_location(path.clone()),
    };
    command_clear(clear).await.unwrap();
    assert_eq!(store.get_latest().unwrap(), None);
}

#[tokio::test]
async fn put_rejects_invalid_profile_before_touching_disk() {
    let (_temp, path) = temp_store_path();
    let put = PutCommand {
        user_id: "user-a".to_string(),
        profile: "\"not an object\"".to_string(),
        user: None,
        location: store_location(path.clone()),
    };
    assert!(command_put(put).await.is_err());
    assert!(!path.exists());
}
