//! Configuration for hotstate tools.
//!
//! TOML file plus `HOTSTATE_` environment overrides, and translation to
//! `hotstate_core::SharingConfig`. The binary layers its CLI flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hotstate_core::{Overflow, SharingConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Shared stream tuning.
    #[serde(default)]
    pub sharing: SharingSection,

    /// Output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// In-memory demo collaborators.
    #[serde(default)]
    pub demo: DemoSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SharingSection {
    /// Human-readable duration, e.g. "5s" or "750ms".
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    #[serde(default)]
    pub overflow: Overflow,
}

impl Default for SharingSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            buffer_capacity: default_buffer_capacity(),
            overflow: Overflow::default(),
        }
    }
}

fn default_grace_period() -> String {
    humantime::format_duration(hotstate_core::DEFAULT_GRACE_PERIOD).to_string()
}
fn default_buffer_capacity() -> usize {
    hotstate_core::DEFAULT_BUFFER_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "text".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DemoSection {
    /// Simulated round-trip of the fake auth service.
    #[serde(default = "default_latency")]
    pub latency: String,

    /// Account the fake auth service accepts.
    #[serde(default = "default_email")]
    pub email: String,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            latency: default_latency(),
            email: default_email(),
        }
    }
}

fn default_latency() -> String {
    "200ms".into()
}
fn default_email() -> String {
    "user@example.com".into()
}

// ── Validation ──────────────────────────────────────────────────────

fn parse_duration(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{raw}' is not a duration ({e})"),
    })
}

impl SharingSection {
    /// Translate to the runtime config, rejecting unusable values.
    pub fn to_sharing_config(&self) -> Result<SharingConfig, ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "sharing.buffer_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(SharingConfig::default()
            .with_grace_period(parse_duration("sharing.grace_period", &self.grace_period)?)
            .with_buffer_capacity(self.buffer_capacity)
            .with_overflow(self.overflow))
    }
}

impl DemoSection {
    pub fn latency(&self) -> Result<Duration, ConfigError> {
        parse_duration("demo.latency", &self.latency)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "hotstate", "hotstate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hotstate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; the defaults apply.
///
/// Nested keys use a double underscore:
/// `HOTSTATE_SHARING__GRACE_PERIOD=750ms`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HOTSTATE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_sharing_matches_core_defaults() {
        let sharing = Config::default().sharing.to_sharing_config().unwrap();
        assert_eq!(sharing, SharingConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[sharing]\ngrace_period = \"750ms\"\noverflow = \"conflate\"\n\n[defaults]\noutput = \"json\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");

        let sharing = cfg.sharing.to_sharing_config().unwrap();
        assert_eq!(sharing.grace_period, Duration::from_millis(750));
        assert_eq!(sharing.overflow, Overflow::Conflate);
        assert_eq!(sharing.buffer_capacity, 64);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.sharing, SharingSection::default());
        assert_eq!(cfg.demo.latency().unwrap(), Duration::from_millis(200));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sharing]\nbuffer_capacity = \"lots\"\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Figment(_))
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let section = SharingSection {
            buffer_capacity: 0,
            ..SharingSection::default()
        };
        let err = section.to_sharing_config().unwrap_err();
        assert!(err.to_string().contains("sharing.buffer_capacity"));
    }

    #[test]
    fn bad_duration_is_rejected() {
        let section = SharingSection {
            grace_period: "soon".into(),
            ..SharingSection::default()
        };
        let err = section.to_sharing_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "sharing.grace_period"));
    }

    #[test]
    fn save_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.sharing.buffer_capacity = 8;

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
