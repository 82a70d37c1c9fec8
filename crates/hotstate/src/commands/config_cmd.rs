//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = match config::output_format(&cfg, global)? {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::Text => toml::to_string_pretty(&cfg)?,
            };
            output::print_output(rendered.trim_end());
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            hotstate_config::save_config_to(&Config::default(), &path)?;
            eprintln!("Wrote default configuration to {}", path.display());
            Ok(())
        }
    }
}
