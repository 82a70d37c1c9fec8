//! Profile screen: the signed-in account plus a sign-out action.

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;
use tokio::task::JoinHandle;

use hotstate_core::{
    AsyncState, DataSource, Failure, Scope, SharingConfig, StateController, Subscription,
};

use crate::services::{AuthService, PreferencesStore, UserPreferences};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    pub fn signed_in(&self) -> bool {
        self.email.is_some()
    }
}

impl From<&UserPreferences> for Profile {
    fn from(prefs: &UserPreferences) -> Self {
        Self {
            name: prefs.display_name.clone(),
            email: prefs.email.clone(),
        }
    }
}

/// The preferences store seen as a sequence of profiles.
struct ProfileSource(PreferencesStore);

impl DataSource<Profile> for ProfileSource {
    fn observe(&self) -> BoxStream<'static, Result<Profile, Failure>> {
        self.0
            .observe()
            .map(|prefs| prefs.map(|p| Profile::from(&p)))
            .boxed()
    }
}

pub struct ProfileScreen {
    controller: StateController<Profile>,
    auth: AuthService,
    prefs: PreferencesStore,
}

impl ProfileScreen {
    /// Loading until the first profile arrives; observation starts with
    /// the first subscriber.
    pub fn new(
        scope: Scope,
        prefs: PreferencesStore,
        auth: AuthService,
        config: SharingConfig,
    ) -> Self {
        let controller = StateController::observing(
            scope,
            AsyncState::loading(Profile::default()),
            ProfileSource(prefs.clone()),
            config,
        );
        Self {
            controller,
            auth,
            prefs,
        }
    }

    pub fn subscribe(&self) -> Subscription<AsyncState<Profile>> {
        self.controller.subscribe()
    }

    /// Sign out, then clear the stored preferences. The profile itself is
    /// updated by the store emission, not by this operation.
    pub fn sign_out(&self) -> JoinHandle<Option<()>> {
        let auth = self.auth.clone();
        let prefs = self.prefs.clone();
        self.controller.run_with(move |_| async move {
            auth.sign_out().await?;
            prefs.reset();
            Ok(())
        })
    }

    pub async fn close(&self) {
        self.controller.shutdown().await;
    }
}
