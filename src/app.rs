//! Application state: one session shared by every client and store.

use std::sync::Arc;

use crate::client::{BackendApi, HttpBackend};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::image_store::{ImageKitStore, ImageStore};
use crate::session::SessionContext;
use crate::store::{AuthStore, MedicalStore};
use crate::upload::UploadOrchestrator;
use crate::validation::upload_hint;

pub struct AppState {
    config: ClientConfig,
    session: Arc<SessionContext>,
    auth: AuthStore,
    medical: MedicalStore,
    uploads: UploadOrchestrator,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let session = Arc::new(SessionContext::new());
        let api: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(config.clone(), session.clone())?);
        let store: Arc<dyn ImageStore> = Arc::new(ImageKitStore::new(&config)?);
        tracing::info!(
            api = %config.api_base_url,
            max_upload_bytes = config.max_upload_bytes,
            "Client state initialized"
        );
        Ok(Self::with_components(config, session, api, store))
    }

    /// Wire the stores around already-built clients.
    pub fn with_components(
        config: ClientConfig,
        session: Arc<SessionContext>,
        api: Arc<dyn BackendApi>,
        store: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            auth: AuthStore::new(api.clone(), session.clone()),
            medical: MedicalStore::new(api.clone()),
            uploads: UploadOrchestrator::new(api, store, config.max_upload_bytes),
            config,
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn medical(&self) -> &MedicalStore {
        &self.medical
    }

    pub fn uploads(&self) -> &UploadOrchestrator {
        &self.uploads
    }

    /// "Supported formats: ..." line for the upload panel.
    pub fn upload_hint(&self) -> String {
        upload_hint(self.config.max_upload_bytes)
    }

    /// True when no token is held, e.g. before login or after a 401.
    pub fn login_required(&self) -> bool {
        !self.session.has_token()
    }

    /// Sign the user out if a 401 dropped the session since the last call.
    /// Returns whether that happened.
    pub fn handle_session_expired(&self) -> bool {
        if !self.session.take_expired() {
            return false;
        }
        tracing::info!("Session expired, signing out");
        self.auth.logout();
        true
    }
}
