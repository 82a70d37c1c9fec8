//! Session command handler.

use hotstate_core::Scope;

use super::{Context, util};
use crate::error::CliError;
use crate::screens::SessionScreen;
use crate::services::UserPreferences;

fn describe(prefs: &UserPreferences) -> String {
    let theme = if prefs.dark_theme { "dark" } else { "light" };
    match &prefs.email {
        Some(email) => format!("signed in as {email}, {theme} theme"),
        None => format!("signed out, {theme} theme"),
    }
}

pub async fn handle(ctx: &Context) -> Result<(), CliError> {
    let screen = SessionScreen::new(Scope::new(), ctx.prefs.clone(), ctx.sharing.clone());
    let mut sub = screen.subscribe();
    util::follow(&mut sub, &ctx.printer, describe, |state| !state.loading).await?;

    drop(sub);
    screen.close().await;
    Ok(())
}
