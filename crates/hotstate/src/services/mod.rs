//! In-memory collaborators the demo screens run against.

pub mod auth;
pub mod preferences;

pub use auth::AuthService;
pub use preferences::{PreferencesStore, UserPreferences};
