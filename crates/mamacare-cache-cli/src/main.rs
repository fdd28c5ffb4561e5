// crates/mamacare-cache-cli/src/main.rs
// ============================================================================
// Module: MamaCare Cache CLI Entry Point
// Description: Command dispatcher for inspecting and maintaining a cache file.
// Purpose: Read, seed, list, and clear an on-device profile cache safely.
// Dependencies: clap, mamacare-cache-*, serde, serde_json, thiserror, tokio,
//               tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `mamacare-cache` opens a profile cache file directly and reports storage
//! errors instead of masking them, which is what a maintenance tool needs.
//! Store location comes from the config file (`--config`,
//! `MAMACARE_CACHE_CONFIG`, or `mamacare-cache.toml`) or from `--store-path`.
//! Cache contents are untrusted input; payloads are printed as JSON only.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use mamacare_cache_config::CacheConfig;
use mamacare_cache_config::LogLevel;
use mamacare_cache_config::config_toml_example;
use mamacare_cache_core::Attributes;
use mamacare_cache_core::CacheEntrySummary;
use mamacare_cache_core::CacheError;
use mamacare_cache_core::CacheWrite;
use mamacare_cache_core::ProfileCacheStore;
use mamacare_cache_core::UserId;
use mamacare_cache_sqlite::SqliteProfileCache;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding a log filter directive.
const LOG_ENV: &str = "MAMACARE_CACHE_LOG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "mamacare-cache", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the cached record for a user.
    Get(GetCommand),
    /// Print the most recently written record.
    Latest(LatestCommand),
    /// List cached records, most recent first.
    List(ListCommand),
    /// Write a record into the cache.
    Put(PutCommand),
    /// Remove every cached record.
    Clear(ClearCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a cache configuration file.
    Validate(ConfigValidateCommand),
    /// Print an annotated example configuration file.
    Example,
}

/// Store location arguments shared by cache commands.
#[derive(Args, Debug, Clone, Default)]
struct StoreLocationArgs {
    /// Optional config file path (defaults to mamacare-cache.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Optional direct `SQLite` file path (overrides the configured location).
    #[arg(long = "store-path", value_name = "PATH")]
    store_path: Option<PathBuf>,
}

/// Output formats for listing.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// JSON output.
    #[default]
    Json,
    /// Human-readable text output.
    Text,
}

/// Arguments for `get`.
#[derive(Args, Debug)]
struct GetCommand {
    /// User identifier.
    #[arg(long = "user-id", value_name = "ID")]
    user_id: String,
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
}

/// Arguments for `latest`.
#[derive(Args, Debug)]
struct LatestCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
}

/// Arguments for `put`.
#[derive(Args, Debug)]
struct PutCommand {
    /// User identifier.
    #[arg(long = "user-id", value_name = "ID")]
    user_id: String,
    /// Profile attributes as a JSON object.
    #[arg(long, value_name = "JSON")]
    profile: String,
    /// Session attributes as a JSON object; omit for a profile-only write.
    #[arg(long, value_name = "JSON")]
    user: Option<String>,
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
}

/// Arguments for `clear`.
#[derive(Args, Debug)]
struct ClearCommand {
    /// Store location settings.
    #[command(flatten)]
    location: StoreLocationArgs,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to mamacare-cache.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Get(command) => command_get(command).await,
        Commands::Latest(command) => command_latest(command).await,
        Commands::List(command) => command_list(command).await,
        Commands::Put(command) => command_put(command).await,
        Commands::Clear(command) => command_clear(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Cache Commands
// ============================================================================

/// Executes `get`.
async fn command_get(command: GetCommand) -> CliResult<ExitCode> {
    let id = parse_user_id(&command.user_id)?;
    let store = open_store(&command.location)?;
    let lookup = id.clone();
    let record = run_store("get", move || store.get(&lookup)).await?;
    let Some(record) = record else {
        return Err(CliError::new(format!("no cached record for user {id}")));
    };
    write_json(&record)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `latest`.
async fn command_latest(command: LatestCommand) -> CliResult<ExitCode> {
    let store = open_store(&command.location)?;
    let record = run_store("latest", move || store.get_latest()).await?;
    let Some(record) = record else {
        return Err(CliError::new("profile cache is empty".to_string()));
    };
    write_json(&record)?;
    Ok(ExitCode::SUCCESS)
}

/// Output for `list`.
#[derive(Serialize)]
struct ListOutput {
    /// Cached record summaries, most recent first.
    entries: Vec<CacheEntrySummary>,
}

/// Executes `list`.
async fn command_list(command: ListCommand) -> CliResult<ExitCode> {
    let store = open_store(&command.location)?;
    let entries = run_store("list", move || store.list()).await?;
    let output = ListOutput {
        entries,
    };
    match command.format {
        OutputFormat::Json => write_json(&output)?,
        OutputFormat::Text => write_stdout_text(&render_list_text(&output))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `put`.
async fn command_put(command: PutCommand) -> CliResult<ExitCode> {
    let id = parse_user_id(&command.user_id)?;
    let profile = parse_attributes("--profile", &command.profile)?;
    let user = command.user.as_deref().map(|text| parse_attributes("--user", text)).transpose()?;
    let write = CacheWrite::new(id.clone(), profile, user);
    let mode = write.mode();
    let store = open_store(&command.location)?;
    run_store("put", move || store.upsert(&write)).await?;
    write_stdout_line(&format!("cached record for user {id} ({})", mode.as_str()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `clear`.
async fn command_clear(command: ClearCommand) -> CliResult<ExitCode> {
    let store = open_store(&command.location)?;
    run_store("clear", move || store.clear()).await?;
    write_stdout_line("profile cache cleared")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
        ConfigCommand::Example => {
            write_stdout_text(&config_toml_example())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = CacheConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let store = config
        .store_config()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line(&format!("config ok: store at {}", store.path.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Helpers
// ============================================================================

/// Resolves the cache configuration from CLI location arguments.
fn resolve_cache_config(location: &StoreLocationArgs) -> CliResult<CacheConfig> {
    match (&location.store_path, location.config.as_deref()) {
        (Some(store_path), None) => Ok(CacheConfig::for_store_path(store_path)),
        (Some(store_path), Some(config_path)) => CacheConfig::load(Some(config_path))
            .map(|config| config.with_store_path(store_path))
            .map_err(|err| CliError::new(format!("failed to load config: {err}"))),
        (None, config_path) => CacheConfig::load(config_path)
            .map_err(|err| CliError::new(format!("failed to load config: {err}"))),
    }
}

/// Resolves configuration, installs logging, and builds the store.
fn open_store(location: &StoreLocationArgs) -> CliResult<SqliteProfileCache> {
    let config = resolve_cache_config(location)?;
    init_tracing(config.logging.level);
    let store_config = config
        .store_config()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    Ok(SqliteProfileCache::new(store_config))
}

/// Runs a store operation on the blocking pool.
async fn run_store<T, F>(operation: &'static str, call: F) -> CliResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|err| CliError::new(format!("{operation} failed: worker join failed: {err}")))?
        .map_err(|err| CliError::new(format!("{operation} failed: {err}")))
}

/// Installs the stderr log subscriber.
///
/// `MAMACARE_CACHE_LOG` wins over the configured level. Repeated calls keep
/// the first subscriber and report the refusal at debug level.
fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    if let Err(err) =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init()
    {
        debug!(error = %err, "log subscriber already installed");
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses and validates a user identifier argument.
fn parse_user_id(raw: &str) -> CliResult<UserId> {
    let id = UserId::new(raw);
    id.validate().map_err(|reason| CliError::new(format!("invalid --user-id: {reason}")))?;
    Ok(id)
}

/// Parses an attribute bag from a JSON object argument.
fn parse_attributes(flag: &str, text: &str) -> CliResult<Attributes> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| CliError::new(format!("{flag} is not valid JSON: {err}")))?;
    Attributes::from_value(value)
        .ok_or_else(|| CliError::new(format!("{flag} must be a JSON object")))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Renders list output in text form.
fn render_list_text(output: &ListOutput) -> String {
    let mut buffer = String::from("cached profiles:\n");
    if output.entries.is_empty() {
        buffer.push_str("  (none)\n");
        return buffer;
    }
    for entry in &output.entries {
        let session = if entry.has_user_data { "session" } else { "no-session" };
        buffer.push_str(&format!(
            "  {} updated_at={} profile_bytes={} user_bytes={} {session}\n",
            entry.id, entry.updated_at, entry.profile_bytes, entry.user_bytes
        ));
    }
    buffer
}

/// Writes a value as compact JSON followed by a newline.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&text)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| output_error("stdout", &err))
}

/// Writes pre-terminated text to stdout.
fn write_stdout_text(text: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes()).map_err(|err| output_error("stdout", &err))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(format!("failed to write to {stream}: {error}"))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
