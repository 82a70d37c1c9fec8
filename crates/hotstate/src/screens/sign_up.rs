//! Sign-up form: like sign-in, plus a full name, and submission creates
//! the account.

use serde::Serialize;
use tokio::task::JoinHandle;

use hotstate_core::{AsyncState, Scope, SharingConfig, StateController, Subscription};

use super::sign_in::{
    EMAIL_NOT_VALID, PASSWORD_NOT_VALID, TextField, is_email_valid, is_password_valid,
};
use crate::services::AuthService;

pub const NAME_NOT_VALID: &str = "Name Not Valid";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignUpForm {
    pub name: TextField,
    pub email: TextField,
    #[serde(skip)]
    pub password: TextField,
    pub registered_as: Option<String>,
}

impl SignUpForm {
    /// The first field carrying a validation message, in form order.
    pub fn first_error(&self) -> Option<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
        ]
        .into_iter()
        .find_map(|(field, input)| input.error.as_deref().map(|err| (field, err)))
    }
}

/// Two or more words made of letters, hyphens and apostrophes.
pub fn is_name_valid(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    words.len() >= 2
        && words.iter().all(|word| {
            word.chars().next().is_some_and(char::is_alphabetic)
                && word
                    .chars()
                    .all(|c| c.is_alphabetic() || c == '-' || c == '\'')
        })
}

pub struct SignUpScreen {
    controller: StateController<SignUpForm>,
    auth: AuthService,
}

impl SignUpScreen {
    pub fn new(scope: Scope, auth: AuthService, config: SharingConfig) -> Self {
        Self {
            controller: StateController::with_scope(
                scope,
                AsyncState::new(SignUpForm::default()),
                config,
            ),
            auth,
        }
    }

    pub fn subscribe(&self) -> Subscription<AsyncState<SignUpForm>> {
        self.controller.subscribe()
    }

    pub fn form(&self) -> SignUpForm {
        self.controller.state().data
    }

    pub fn update_name(&self, name: &str) {
        self.controller.update_state(|form| SignUpForm {
            name: TextField::checked(name, is_name_valid(name), NAME_NOT_VALID),
            ..form.clone()
        });
    }

    pub fn update_email(&self, email: &str) {
        self.controller.update_state(|form| SignUpForm {
            email: TextField::checked(email, is_email_valid(email), EMAIL_NOT_VALID),
            ..form.clone()
        });
    }

    pub fn update_password(&self, password: &str) {
        self.controller.update_state(|form| SignUpForm {
            password: TextField::checked(password, is_password_valid(password), PASSWORD_NOT_VALID),
            ..form.clone()
        });
    }

    /// Create the account from the current form; the password is cleared
    /// once it has been accepted.
    pub fn register(&self) -> JoinHandle<Option<()>> {
        let auth = self.auth.clone();
        self.controller.update_with(move |form| async move {
            auth.register(
                form.name.value.trim(),
                &form.email.value,
                &form.password.value,
            )
            .await?;
            Ok(SignUpForm {
                registered_as: Some(form.email.value.clone()),
                password: TextField::default(),
                ..form
            })
        })
    }

    pub async fn close(&self) {
        self.controller.shutdown().await;
    }
}
