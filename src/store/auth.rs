use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::client::BackendApi;
use crate::error::ClientError;
use crate::models::{AuthResponse, CreateAccountData, LoginCredentials, User};
use crate::session::SessionContext;

const LOGIN_FAILED: &str = "Login failed";
const ACCOUNT_CREATION_FAILED: &str = "Account creation failed";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    Started,
    Authenticated(User),
    Failed(String),
    LoggedOut,
    ClearError,
}

pub fn reduce(state: &AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::Started => AuthState {
            loading: true,
            error: None,
            ..state.clone()
        },
        AuthAction::Authenticated(user) => AuthState {
            user: Some(user),
            is_authenticated: true,
            loading: false,
            error: None,
        },
        AuthAction::Failed(message) => AuthState {
            loading: false,
            error: Some(message),
            ..state.clone()
        },
        AuthAction::LoggedOut => AuthState::default(),
        AuthAction::ClearError => AuthState {
            error: None,
            ..state.clone()
        },
    }
}

/// Holds the signed-in user and writes the session token on success.
pub struct AuthStore {
    state: RwLock<AuthState>,
    api: Arc<dyn BackendApi>,
    session: Arc<SessionContext>,
}

impl AuthStore {
    pub fn new(api: Arc<dyn BackendApi>, session: Arc<SessionContext>) -> Self {
        Self {
            state: RwLock::new(AuthState::default()),
            api,
            session,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated
    }

    fn dispatch(&self, action: AuthAction) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = reduce(&state, action);
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ClientError> {
        self.dispatch(AuthAction::Started);
        let result = self.api.login(credentials).await;
        self.settle(result, LOGIN_FAILED)
    }

    /// Checks the form locally, then registers. Success signs the user in.
    pub async fn create_account(&self, data: &CreateAccountData) -> Result<User, ClientError> {
        if let Err(e) = data.validate() {
            self.dispatch(AuthAction::Failed(e.user_message()));
            return Err(e);
        }
        self.dispatch(AuthAction::Started);
        let result = self.api.register(data).await;
        self.settle(result, ACCOUNT_CREATION_FAILED)
    }

    fn settle(
        &self,
        result: Result<AuthResponse, ClientError>,
        fallback: &str,
    ) -> Result<User, ClientError> {
        match result {
            Ok(AuthResponse { user, token, .. }) => {
                self.session.set_token(&token);
                tracing::info!(user_id = %user.id, "Signed in");
                self.dispatch(AuthAction::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                let message = e.backend_message().unwrap_or(fallback).to_string();
                tracing::warn!(error = %e, "Authentication failed");
                self.dispatch(AuthAction::Failed(message));
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.session.clear();
        self.dispatch(AuthAction::LoggedOut);
        tracing::info!("Signed out");
    }

    pub fn clear_error(&self) {
        self.dispatch(AuthAction::ClearError);
    }
}
