mod config;
pub mod database;
mod initialize;
pub mod keys;
mod kv;
mod settings;

pub use config::{
    AnalyticsConfig, BlockingConfig, Config, CountdownConfig, MarkerConfig, TimingConfig,
};
pub use database::Database;
pub use initialize::{default_entries, initialize};
pub use kv::{as_count, json_number, KvStore, MemoryStore, Record};
pub use settings::{is_enabled, load_settings, set_enabled, toggle_enabled, Settings};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusguard[-dev]/` based on FOCUSGUARD_ENV.
///
/// Set FOCUSGUARD_ENV=dev to use development data directory.
/// FOCUSGUARD_DATA_DIR overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSGUARD_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSGUARD_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("focusguard-dev")
            } else {
                base_dir.join("focusguard")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
