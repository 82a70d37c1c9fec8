//! Session screen: mirrors the user preferences store.

use hotstate_core::{AsyncState, Scope, SharingConfig, StateController, Subscription};

use crate::services::{PreferencesStore, UserPreferences};

/// Loading with default preferences until the store has been read.
pub struct SessionScreen {
    controller: StateController<UserPreferences>,
}

impl SessionScreen {
    pub fn new(scope: Scope, prefs: PreferencesStore, config: SharingConfig) -> Self {
        Self {
            controller: StateController::observing(
                scope,
                AsyncState::loading(UserPreferences::default()),
                prefs,
                config,
            ),
        }
    }

    pub fn subscribe(&self) -> Subscription<AsyncState<UserPreferences>> {
        self.controller.subscribe()
    }

    pub async fn close(&self) {
        self.controller.shutdown().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hotstate_core::Phase;

    use super::*;

    #[tokio::test]
    async fn loads_then_follows_store() {
        let prefs = PreferencesStore::default();
        prefs.sign_in("ada@example.com");
        let screen = SessionScreen::new(Scope::new(), prefs.clone(), SharingConfig::default());
        let mut sub = screen.subscribe();

        let first = sub.recv().await.unwrap();
        assert_eq!(first.phase(), Phase::Loading);
        assert_eq!(first.data, UserPreferences::default());

        let loaded = sub.recv().await.unwrap();
        assert_eq!(loaded.phase(), Phase::Idle);
        assert!(loaded.data.email.is_some());

        prefs.reset();
        assert_eq!(sub.recv().await.unwrap().data, UserPreferences::default());
    }
}
