//! User preferences store: a `watch` channel holding the current value.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use hotstate_core::{DataSource, Failure};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPreferences {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub dark_theme: bool,
}

/// Cheaply cloneable handle; every clone writes to the same store.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    tx: Arc<watch::Sender<UserPreferences>>,
}

impl PreferencesStore {
    pub fn new(initial: UserPreferences) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Record a signed-in account, deriving the display name from the
    /// email's local part.
    pub fn sign_in(&self, email: &str) {
        let name = email.split('@').next().unwrap_or(email).to_owned();
        self.tx.send_modify(|prefs| {
            prefs.email = Some(email.to_owned());
            prefs.display_name = Some(name);
        });
        debug!(email, "preferences: signed in");
    }

    /// Record a newly registered account under the name it was created with.
    pub fn register(&self, name: &str, email: &str) {
        self.tx.send_modify(|prefs| {
            prefs.email = Some(email.to_owned());
            prefs.display_name = Some(name.to_owned());
        });
        debug!(email, "preferences: registered");
    }

    pub fn reset(&self) {
        self.tx.send_replace(UserPreferences::default());
        debug!("preferences reset");
    }
}

impl Default for PreferencesStore {
    fn default() -> Self {
        Self::new(UserPreferences::default())
    }
}

impl DataSource<UserPreferences> for PreferencesStore {
    fn observe(&self) -> BoxStream<'static, Result<UserPreferences, Failure>> {
        WatchStream::new(self.tx.subscribe()).map(Ok).boxed()
    }
}
