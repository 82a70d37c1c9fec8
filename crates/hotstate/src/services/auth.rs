//! Fake authentication service with a configurable round-trip delay.

use std::time::Duration;

use tracing::{info, warn};

use hotstate_core::Failure;

use super::PreferencesStore;

#[derive(Debug, Clone)]
pub struct AuthService {
    account: String,
    latency: Duration,
    reject: bool,
    fail_sign_out: bool,
    prefs: PreferencesStore,
}

impl AuthService {
    /// A service that accepts `account` (case-insensitively) with any
    /// non-empty password.
    pub fn new(account: impl Into<String>, latency: Duration, prefs: PreferencesStore) -> Self {
        Self {
            account: account.into(),
            latency,
            reject: false,
            fail_sign_out: false,
            prefs,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn rejecting(mut self, reject: bool) -> Self {
        self.reject = reject;
        self
    }

    pub fn failing_sign_out(mut self, fail: bool) -> Self {
        self.fail_sign_out = fail;
        self
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), Failure> {
        tokio::time::sleep(self.latency).await;
        if self.reject || password.is_empty() || !email.eq_ignore_ascii_case(&self.account) {
            warn!(email, "sign-in rejected");
            return Err(Failure::new("invalid email or password"));
        }
        self.prefs.sign_in(email);
        info!(email, "signed in");
        Ok(())
    }

    /// Create an account. The configured account already exists, so
    /// registering its email again is refused.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), Failure> {
        tokio::time::sleep(self.latency).await;
        if self.reject || password.is_empty() {
            warn!(email, "registration refused");
            return Err(Failure::new("registration refused"));
        }
        if email.eq_ignore_ascii_case(&self.account) {
            warn!(email, "registration for an existing account");
            return Err(Failure::new("an account with this email already exists"));
        }
        self.prefs.register(name, email);
        info!(email, "registered");
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), Failure> {
        tokio::time::sleep(self.latency).await;
        if self.fail_sign_out {
            return Err(Failure::new("session service unavailable"));
        }
        info!("signed out");
        Ok(())
    }
}
