//! Command dispatch: builds the services and screen for a command, drives
//! it and prints what its controller publishes.

pub mod config_cmd;
pub mod profile;
pub mod session;
pub mod sign_in;
pub mod sign_up;
pub mod util;

use hotstate_core::SharingConfig;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::{self, Printer};
use crate::services::{AuthService, PreferencesStore};

/// Everything a screen command needs, resolved once from config + flags.
pub struct Context {
    pub sharing: SharingConfig,
    pub printer: Printer,
    pub prefs: PreferencesStore,
    pub auth: AuthService,
}

impl Context {
    pub fn build(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let sharing = config::sharing_config(cfg, global)?;
        let format = config::output_format(cfg, global)?;
        let color = output::should_color(config::color_mode(cfg, global)?);
        let latency = cfg.demo.latency()?;

        let prefs = PreferencesStore::default();
        let auth = AuthService::new(cfg.demo.email.clone(), latency, prefs.clone());
        Ok(Self {
            sharing,
            printer: Printer::new(format, color),
            prefs,
            auth,
        })
    }
}

/// Dispatch a command to the appropriate handler.
///
/// `config` subcommands run before the config file is loaded so they keep
/// working when the file is unusable.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let cmd = match cmd {
        Command::Config(args) => return config_cmd::handle(&args, global),
        cmd => cmd,
    };

    let cfg = config::load(global)?;
    let ctx = Context::build(&cfg, global)?;
    tracing::debug!(command = ?cmd, sharing = ?ctx.sharing, "dispatching command");
    match cmd {
        Command::Session => session::handle(&ctx).await,
        Command::Profile(args) => profile::handle(&args, &ctx).await,
        Command::SignIn(args) => sign_in::handle(&args, &ctx).await,
        Command::SignUp(args) => sign_up::handle(&args, &ctx).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}
