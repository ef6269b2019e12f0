//! TOML-based application configuration.
//!
//! Every value has a compiled-in default; the extension build uses those
//! directly. The CLI can persist overrides at
//! `~/.config/focusguard/config.toml`:
//! - Blocked path prefix and redirect target
//! - Countdown length and step interval
//! - Retry / fallback delays
//! - DOM marker ids
//! - Minutes credited per blocked video

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use super::settings::Settings;
use crate::error::ConfigError;

pub const DEFAULT_PATH_PREFIX: &str = "/shorts";
pub const DEFAULT_REDIRECT_URL: &str = "https://www.youtube.com/";
pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;
pub const DEFAULT_COUNTDOWN_INTERVAL_MS: u64 = 500;
pub const DEFAULT_FALLBACK_REDIRECT_MS: u64 = 1500;
pub const DEFAULT_OBSERVER_RETRY_MS: u64 = 100;
pub const DEFAULT_BODY_CHECK_RETRY_MS: u64 = 10;
pub const DEFAULT_PANEL_HIDE_MS: u64 = 300;
pub const DEFAULT_MINUTES_PER_BLOCK: f64 = 0.5;

/// What gets blocked and where the user is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingConfig {
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
}

/// Warning overlay countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_countdown_secs")]
    pub duration_secs: u32,
    #[serde(default = "default_countdown_interval_ms")]
    pub interval_ms: u64,
}

/// Retry and safety-net delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_fallback_redirect_ms")]
    pub fallback_redirect_ms: u64,
    #[serde(default = "default_observer_retry_ms")]
    pub observer_retry_ms: u64,
    #[serde(default = "default_body_check_retry_ms")]
    pub body_check_retry_ms: u64,
    #[serde(default = "default_panel_hide_ms")]
    pub panel_hide_ms: u64,
}

/// Element ids used as cross-call state markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_blocking_css_id")]
    pub blocking_css_id: String,
    #[serde(default = "default_warning_overlay_id")]
    pub warning_overlay_id: String,
    #[serde(default = "default_countdown_id")]
    pub countdown_id: String,
    #[serde(default = "default_stats_panel_id")]
    pub stats_panel_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Estimated length of one short-form video.
    #[serde(default = "default_minutes_per_block")]
    pub minutes_per_block: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusguard/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub blocking: BlockingConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

// Default functions
fn default_path_prefix() -> String {
    DEFAULT_PATH_PREFIX.into()
}
fn default_redirect_url() -> String {
    DEFAULT_REDIRECT_URL.into()
}
fn default_countdown_secs() -> u32 {
    DEFAULT_COUNTDOWN_SECS
}
fn default_countdown_interval_ms() -> u64 {
    DEFAULT_COUNTDOWN_INTERVAL_MS
}
fn default_fallback_redirect_ms() -> u64 {
    DEFAULT_FALLBACK_REDIRECT_MS
}
fn default_observer_retry_ms() -> u64 {
    DEFAULT_OBSERVER_RETRY_MS
}
fn default_body_check_retry_ms() -> u64 {
    DEFAULT_BODY_CHECK_RETRY_MS
}
fn default_panel_hide_ms() -> u64 {
    DEFAULT_PANEL_HIDE_MS
}
fn default_blocking_css_id() -> String {
    "focusguard-hide".into()
}
fn default_warning_overlay_id() -> String {
    "focusguard-warning".into()
}
fn default_countdown_id() -> String {
    "focusguard-countdown".into()
}
fn default_stats_panel_id() -> String {
    "focusguard-stats-panel".into()
}
fn default_minutes_per_block() -> f64 {
    DEFAULT_MINUTES_PER_BLOCK
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            path_prefix: default_path_prefix(),
            redirect_url: default_redirect_url(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_COUNTDOWN_SECS,
            interval_ms: DEFAULT_COUNTDOWN_INTERVAL_MS,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fallback_redirect_ms: DEFAULT_FALLBACK_REDIRECT_MS,
            observer_retry_ms: DEFAULT_OBSERVER_RETRY_MS,
            body_check_retry_ms: DEFAULT_BODY_CHECK_RETRY_MS,
            panel_hide_ms: DEFAULT_PANEL_HIDE_MS,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            blocking_css_id: default_blocking_css_id(),
            warning_overlay_id: default_warning_overlay_id(),
            countdown_id: default_countdown_id(),
            stats_panel_id: default_stats_panel_id(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            minutes_per_block: DEFAULT_MINUTES_PER_BLOCK,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blocking: BlockingConfig::default(),
            countdown: CountdownConfig::default(),
            timing: TimingConfig::default(),
            markers: MarkerConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => {
                        return Err(invalid("cannot overwrite a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Settings written to a fresh store.
    pub fn default_settings(&self) -> Settings {
        Settings {
            extension_enabled: true,
            countdown_duration: u64::from(self.countdown.duration_secs),
            redirect_url: self.blocking.redirect_url.clone(),
        }
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown.interval_ms)
    }

    pub fn fallback_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.timing.fallback_redirect_ms)
    }

    pub fn observer_retry_delay(&self) -> Duration {
        Duration::from_millis(self.timing.observer_retry_ms)
    }

    pub fn body_check_retry_delay(&self) -> Duration {
        Duration::from_millis(self.timing.body_check_retry_ms)
    }

    pub fn panel_hide_delay(&self) -> Duration {
        Duration::from_millis(self.timing.panel_hide_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[countdown]\nduration_secs = 5\n").unwrap();
        assert_eq!(parsed.countdown.duration_secs, 5);
        assert_eq!(parsed.countdown.interval_ms, 500);
        assert_eq!(parsed.blocking.path_prefix, "/shorts");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("blocking.path_prefix").as_deref(), Some("/shorts"));
        assert_eq!(cfg.get("timing.fallback_redirect_ms").as_deref(), Some("1500"));
        assert_eq!(cfg.get("analytics.minutes_per_block").as_deref(), Some("0.5"));
        assert!(cfg.get("blocking.missing_key").is_none());
    }

    #[test]
    fn set_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.set("countdown.duration_secs", "10").unwrap();
        cfg.set("blocking.redirect_url", "https://example.com/").unwrap();
        assert_eq!(cfg.countdown.duration_secs, 10);
        assert_eq!(cfg.blocking.redirect_url, "https://example.com/");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("blocking.nonexistent", "x"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_number() {
        let mut cfg = Config::default();
        assert!(cfg.set("countdown.duration_secs", "soon").is_err());
        assert_eq!(cfg.countdown.duration_secs, DEFAULT_COUNTDOWN_SECS);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut changed = first.clone();
        changed.set("timing.panel_hide_ms", "50").unwrap();
        changed.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.timing.panel_hide_ms, 50);
    }

    #[test]
    fn marker_ids_are_distinct() {
        let m = MarkerConfig::default();
        let ids = [
            &m.blocking_css_id,
            &m.warning_overlay_id,
            &m.countdown_id,
            &m.stats_panel_id,
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
