//! CLI-owned configuration resolution: config file + global flag
//! overrides, translated to what the screens need.
//!
//! Core never sees these types; it receives a pre-built `SharingConfig`.

use std::path::PathBuf;
use std::time::Duration;

pub use hotstate_config::Config;

use hotstate_core::SharingConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// The config file in effect: `--config` / `HOTSTATE_CONFIG`, else the
/// platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(hotstate_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(hotstate_config::load_config_from(&config_path(global))?)
}

/// Sharing policy from the file, with `--grace-ms` taking precedence.
pub fn sharing_config(cfg: &Config, global: &GlobalOpts) -> Result<SharingConfig, CliError> {
    let sharing = cfg.sharing.to_sharing_config()?;
    Ok(match global.grace_ms {
        Some(ms) => sharing.with_grace_period(Duration::from_millis(ms)),
        None => sharing,
    })
}

pub fn output_format(cfg: &Config, global: &GlobalOpts) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    match cfg.defaults.output.as_str() {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(CliError::Validation {
            field: "defaults.output".into(),
            reason: format!("expected 'text' or 'json', got '{other}'"),
        }),
    }
}

pub fn color_mode(cfg: &Config, global: &GlobalOpts) -> Result<ColorMode, CliError> {
    if let Some(mode) = global.color {
        return Ok(mode);
    }
    match cfg.defaults.color.as_str() {
        "auto" => Ok(ColorMode::Auto),
        "always" => Ok(ColorMode::Always),
        "never" => Ok(ColorMode::Never),
        other => Err(CliError::Validation {
            field: "defaults.color".into(),
            reason: format!("expected 'auto', 'always' or 'never', got '{other}'"),
        }),
    }
}
