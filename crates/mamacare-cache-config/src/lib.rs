// crates/mamacare-cache-config/src/lib.rs
// ============================================================================
// Module: MamaCare Cache Config
// Description: Configuration model for the offline profile cache.
// Purpose: Load, guard, and validate `mamacare-cache.toml`.
// Dependencies: mamacare-cache-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! [`CacheConfig`] describes where the cache file lives, how `SQLite` is
//! tuned, and the default log level. Loading is strict and fail-closed:
//! oversized, non-UTF-8, or unknown-key input is rejected before use.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::CacheConfig;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::LogLevel;
pub use config::LoggingConfig;
pub use config::MAX_BUSY_TIMEOUT_MS;
pub use config::MAX_CONFIG_FILE_BYTES;
pub use config::StoreConfig;
pub use config::config_toml_example;
pub use config::resolve_config_path;
