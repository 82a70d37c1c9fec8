//! Sign-in command handler: fill in the form, validate, submit.

use hotstate_core::Scope;

use super::{Context, util};
use crate::cli::SignInArgs;
use crate::error::CliError;
use crate::screens::{SignInForm, SignInScreen};

fn describe(form: &SignInForm) -> String {
    let mut line = format!("email={}", form.email.value);
    if let Some(err) = &form.email.error {
        line.push_str(&format!(" ({err})"));
    }
    line.push_str(" password=");
    line.push_str(&"*".repeat(form.password.value.chars().count()));
    if let Some(err) = &form.password.error {
        line.push_str(&format!(" ({err})"));
    }
    if let Some(account) = &form.signed_in_as {
        line.push_str(&format!(" signed in as {account}"));
    }
    line
}

pub async fn handle(args: &SignInArgs, ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.auth.clone().rejecting(args.reject);
    let screen = SignInScreen::new(Scope::new(), auth, ctx.sharing.clone());
    screen.update_email(&args.email);
    screen.update_password(&args.password);

    let mut sub = screen.subscribe();
    util::follow(&mut sub, &ctx.printer, describe, |_| true).await?;

    if let Some((field, reason)) = screen.form().first_error() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: reason.into(),
        });
    }

    let _submit = screen.sign_in();
    let failure = util::follow(&mut sub, &ctx.printer, describe, |state| {
        !state.loading && (state.error.is_some() || state.data.signed_in_as.is_some())
    })
    .await?;

    drop(sub);
    screen.close().await;
    match failure {
        Some(failure) => Err(CliError::Rejected {
            message: failure.message().to_owned(),
        }),
        None => Ok(()),
    }
}
