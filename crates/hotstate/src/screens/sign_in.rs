//! Sign-in form: field edits validate synchronously, submission runs
//! against the auth service.

use serde::Serialize;
use tokio::task::JoinHandle;

use hotstate_core::{AsyncState, Scope, SharingConfig, StateController, Subscription};

use crate::services::AuthService;

pub const EMAIL_NOT_VALID: &str = "Email Not Valid";
pub const PASSWORD_NOT_VALID: &str = "Password Not Valid";

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextField {
    pub value: String,
    pub error: Option<String>,
}

impl TextField {
    pub(crate) fn checked(value: &str, valid: bool, message: &str) -> Self {
        Self {
            value: value.to_owned(),
            error: (!valid).then(|| message.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignInForm {
    pub email: TextField,
    #[serde(skip)]
    pub password: TextField,
    pub signed_in_as: Option<String>,
}

impl SignInForm {
    /// The first field carrying a validation message.
    pub fn first_error(&self) -> Option<(&'static str, &str)> {
        if let Some(err) = &self.email.error {
            return Some(("email", err.as_str()));
        }
        self.password.error.as_deref().map(|err| ("password", err))
    }
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain.
pub fn is_email_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// At least eight characters with a letter and a digit.
pub fn is_password_valid(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

pub struct SignInScreen {
    controller: StateController<SignInForm>,
    auth: AuthService,
}

impl SignInScreen {
    pub fn new(scope: Scope, auth: AuthService, config: SharingConfig) -> Self {
        Self {
            controller: StateController::with_scope(
                scope,
                AsyncState::new(SignInForm::default()),
                config,
            ),
            auth,
        }
    }

    pub fn subscribe(&self) -> Subscription<AsyncState<SignInForm>> {
        self.controller.subscribe()
    }

    pub fn form(&self) -> SignInForm {
        self.controller.state().data
    }

    pub fn update_email(&self, email: &str) {
        self.controller.update_state(|form| SignInForm {
            email: TextField::checked(email, is_email_valid(email), EMAIL_NOT_VALID),
            ..form.clone()
        });
    }

    pub fn update_password(&self, password: &str) {
        self.controller.update_state(|form| SignInForm {
            password: TextField::checked(password, is_password_valid(password), PASSWORD_NOT_VALID),
            ..form.clone()
        });
    }

    /// Submit the form. On success the password is cleared and the account
    /// recorded; on failure the form is kept as it was.
    pub fn sign_in(&self) -> JoinHandle<Option<()>> {
        let auth = self.auth.clone();
        self.controller.update_with(move |form| async move {
            auth.sign_in(&form.email.value, &form.password.value).await?;
            Ok(SignInForm {
                signed_in_as: Some(form.email.value.clone()),
                password: TextField::default(),
                ..form
            })
        })
    }

    pub async fn close(&self) {
        self.controller.shutdown().await;
    }
}
