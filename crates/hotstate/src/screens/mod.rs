//! Screen controllers: one `StateController` per screen, wired to the
//! in-memory services.

pub mod profile;
pub mod session;
pub mod sign_in;
pub mod sign_up;

pub use profile::{Profile, ProfileScreen};
pub use session::SessionScreen;
pub use sign_in::{SignInForm, SignInScreen};
pub use sign_up::{SignUpForm, SignUpScreen};
