//! Profile command handler: show the profile, then sign out.

use hotstate_core::{Phase, Scope};

use super::{Context, util};
use crate::cli::ProfileArgs;
use crate::error::CliError;
use crate::screens::{Profile, ProfileScreen};

fn describe(profile: &Profile) -> String {
    match (&profile.name, &profile.email) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        (None, Some(email)) => email.clone(),
        _ => "(no profile)".into(),
    }
}

pub async fn handle(args: &ProfileArgs, ctx: &Context) -> Result<(), CliError> {
    // Start signed in so there is something to sign out of.
    ctx.prefs.sign_in(ctx.auth.account());

    let auth = ctx.auth.clone().failing_sign_out(args.fail_sign_out);
    let screen = ProfileScreen::new(Scope::new(), ctx.prefs.clone(), auth, ctx.sharing.clone());
    let mut sub = screen.subscribe();
    util::follow(&mut sub, &ctx.printer, describe, |state| {
        state.data.signed_in()
    })
    .await?;

    let _sign_out = screen.sign_out();
    let failure = util::follow(&mut sub, &ctx.printer, describe, |state| {
        state.phase() == Phase::Failed || (!state.loading && !state.data.signed_in())
    })
    .await?;

    drop(sub);
    screen.close().await;
    match failure {
        Some(failure) => Err(CliError::OperationFailed {
            operation: "Sign out".into(),
            message: failure.message().to_owned(),
        }),
        None => Ok(()),
    }
}
