//! Client-side state stores.
//!
//! Each store owns one state slice, changed only through a pure `reduce`
//! over its action enum. Async operations dispatch before and after the
//! network call and never hold the lock across `.await`.

pub mod auth;
pub mod medical;

pub use auth::{AuthAction, AuthState, AuthStore};
pub use medical::{MedicalAction, MedicalState, MedicalStore, Page};
