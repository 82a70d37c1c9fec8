//! Sign-up command handler: fill in the form, validate, register.

use hotstate_core::Scope;

use super::{Context, util};
use crate::cli::SignUpArgs;
use crate::error::CliError;
use crate::screens::{SignUpForm, SignUpScreen};

fn describe(form: &SignUpForm) -> String {
    let mut line = String::new();
    for (label, field) in [("name", &form.name), ("email", &form.email)] {
        line.push_str(&format!("{label}={} ", field.value));
        if let Some(err) = &field.error {
            line.push_str(&format!("({err}) "));
        }
    }
    line.push_str("password=");
    line.push_str(&"*".repeat(form.password.value.chars().count()));
    if let Some(err) = &form.password.error {
        line.push_str(&format!(" ({err})"));
    }
    if let Some(account) = &form.registered_as {
        line.push_str(&format!(" registered as {account}"));
    }
    line
}

pub async fn handle(args: &SignUpArgs, ctx: &Context) -> Result<(), CliError> {
    let auth = ctx.auth.clone().rejecting(args.reject);
    let screen = SignUpScreen::new(Scope::new(), auth, ctx.sharing.clone());
    screen.update_name(&args.name);
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

    let _submit = screen.register();
    let failure = util::follow(&mut sub, &ctx.printer, describe, |state| {
        !state.loading && (state.error.is_some() || state.data.registered_as.is_some())
    })
    .await?;

    drop(sub);
    screen.close().await;
    match failure {
        Some(failure) => Err(CliError::RegistrationRejected {
            message: failure.message().to_owned(),
        }),
        None => Ok(()),
    }
}
