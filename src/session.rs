//! Session context: the single holder of the backend bearer token.
//!
//! The token lives only in memory for the life of the process and is
//! injected into the HTTP client explicitly. Token bytes are zeroed when the
//! token is replaced, cleared or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use zeroize::Zeroize;

/// Bearer token issued by the backend. Zeroed on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SessionToken {
    value: String,
}

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Holds at most one active token.
#[derive(Default)]
pub struct SessionContext {
    token: RwLock<Option<SessionToken>>,
    /// Set when the backend answered 401 and the token was dropped.
    expired: AtomicBool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly issued token, replacing (and zeroing) any previous one.
    /// Empty tokens are ignored.
    pub fn set_token(&self, token: &str) {
        if token.is_empty() {
            tracing::warn!("Backend issued an empty session token, ignoring");
            return;
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SessionToken::new(token));
        self.expired.store(false, Ordering::SeqCst);
        tracing::debug!("Session token stored");
    }

    /// Drop the token (logout).
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Drop the token because the backend rejected it.
    pub fn expire(&self) {
        self.clear();
        self.expired.store(true, Ordering::SeqCst);
        tracing::info!("Session expired, token cleared");
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `Authorization` header value for the current token.
    pub fn bearer(&self) -> Option<String> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|t| format!("Bearer {}", t.as_str()))
    }

    /// Returns true once after a 401 cleared the session.
    pub fn take_expired(&self) -> bool {
        self.expired.swap(false, Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("has_token", &self.has_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_no_token() {
        let session = SessionContext::new();
        assert!(!session.has_token());
        assert!(session.bearer().is_none());
    }

    #[test]
    fn set_token_builds_bearer_header() {
        let session = SessionContext::new();
        session.set_token("abc123");
        assert!(session.has_token());
        assert_eq!(session.bearer().as_deref(), Some("Bearer abc123"));
    }

    #[test]
    fn set_token_replaces_previous() {
        let session = SessionContext::new();
        session.set_token("first");
        session.set_token("second");
        assert_eq!(session.bearer().as_deref(), Some("Bearer second"));
    }

    #[test]
    fn empty_token_is_ignored() {
        let session = SessionContext::new();
        session.set_token("");
        assert!(!session.has_token());
    }

    #[test]
    fn clear_removes_token_without_expiry() {
        let session = SessionContext::new();
        session.set_token("abc");
        session.clear();
        assert!(!session.has_token());
        assert!(!session.take_expired());
    }

    #[test]
    fn expire_is_observed_once() {
        let session = SessionContext::new();
        session.set_token("abc");
        session.expire();
        assert!(!session.has_token());
        assert!(session.take_expired());
        assert!(!session.take_expired());
    }

    #[test]
    fn clear_still_drops_token_after_lock_poisoned() {
        let session = std::sync::Arc::new(SessionContext::new());
        session.set_token("abc");
        let holder = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.token.write().unwrap();
            panic!("writer died holding the token lock");
        })
        .join();
        assert!(session.token.is_poisoned());

        session.clear();
        assert!(!session.has_token());
        assert!(session.bearer().is_none());

        session.set_token("fresh");
        assert_eq!(session.bearer().as_deref(), Some("Bearer fresh"));
    }

    #[test]
    fn debug_output_hides_token() {
        let token = SessionToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "SessionToken(***)");
    }
}
