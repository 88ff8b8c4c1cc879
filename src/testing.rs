//! In-memory `BackendApi` / `ImageStore` doubles for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::BackendApi;
use crate::error::ClientError;
use crate::files::CandidateFile;
use crate::image_store::ImageStore;
use crate::models::{
    AuthResponse, CreateAccountData, LoginCredentials, MedicalRecord, RegistrationPayload,
    RemoteUploadResult, UploadAuth, User,
};
use crate::session::SessionContext;

/// Failure a mock should produce. `ClientError` is not `Clone`.
#[derive(Debug, Clone)]
pub enum MockFailure {
    Http(u16, String),
    Unauthorized,
    Network,
}

impl MockFailure {
    fn into_error(self, session: Option<&SessionContext>) -> ClientError {
        match self {
            Self::Http(status, message) => ClientError::Http { status, message },
            Self::Unauthorized => {
                if let Some(session) = session {
                    session.expire();
                }
                ClientError::Unauthorized
            }
            Self::Network => ClientError::Network("connection refused".into()),
        }
    }
}

pub fn test_user() -> User {
    User {
        id: "u1".into(),
        name: "Asha".into(),
        email: "asha@example.com".into(),
        age: 34,
        mobile_number: "9876543210".into(),
        photo: None,
    }
}

pub struct MockBackend {
    session: Option<Arc<SessionContext>>,
    auth: Mutex<Result<AuthResponse, MockFailure>>,
    records: Mutex<Result<Vec<MedicalRecord>, MockFailure>>,
    upload_auth: Mutex<Result<(), MockFailure>>,
    registration: Mutex<Result<String, MockFailure>>,
    pub upload_auth_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub registrations: Mutex<Vec<RegistrationPayload>>,
    pub fetches: Mutex<Vec<(u32, u32)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            session: None,
            auth: Mutex::new(Ok(AuthResponse {
                user: test_user(),
                token: "tok-123".into(),
                message: None,
            })),
            records: Mutex::new(Ok(Vec::new())),
            upload_auth: Mutex::new(Ok(())),
            registration: Mutex::new(Ok("Prescription uploaded successfully".into())),
            upload_auth_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            registrations: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// A 401 failure expires this session, as the HTTP backend does.
    pub fn with_session(mut self, session: Arc<SessionContext>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_auth_failure(self, failure: MockFailure) -> Self {
        *self.auth.lock().unwrap() = Err(failure);
        self
    }

    pub fn with_records(self, records: Vec<MedicalRecord>) -> Self {
        *self.records.lock().unwrap() = Ok(records);
        self
    }

    pub fn with_records_failure(self, failure: MockFailure) -> Self {
        *self.records.lock().unwrap() = Err(failure);
        self
    }

    pub fn with_upload_auth_failure(self, failure: MockFailure) -> Self {
        *self.upload_auth.lock().unwrap() = Err(failure);
        self
    }

    pub fn set_registration(&self, result: Result<String, MockFailure>) {
        *self.registration.lock().unwrap() = result;
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    fn fail(&self, failure: MockFailure) -> ClientError {
        failure.into_error(self.session.as_deref())
    }

    fn auth_result(&self) -> Result<AuthResponse, ClientError> {
        let result = self.auth.lock().unwrap().clone();
        result.map_err(|f| self.fail(f))
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn login(&self, _credentials: &LoginCredentials) -> Result<AuthResponse, ClientError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.auth_result()
    }

    async fn register(&self, _data: &CreateAccountData) -> Result<AuthResponse, ClientError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.auth_result()
    }

    async fn fetch_records(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<MedicalRecord>, ClientError> {
        self.fetches.lock().unwrap().push((skip, limit));
        let result = self.records.lock().unwrap().clone();
        result.map_err(|f| self.fail(f))
    }

    async fn upload_auth(&self) -> Result<UploadAuth, ClientError> {
        let n = self.upload_auth_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.upload_auth.lock().unwrap().clone();
        result.map_err(|f| self.fail(f))?;
        Ok(UploadAuth {
            signature: format!("sig-{n}"),
            token: format!("one-time-{n}"),
            expire: 1_700_000_000,
        })
    }

    async fn register_prescription(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<String, ClientError> {
        self.registrations.lock().unwrap().push(payload.clone());
        let result = self.registration.lock().unwrap().clone();
        result.map_err(|f| self.fail(f))
    }
}

/// Image store double: returns `https://img/<name>` unless the file is marked to fail.
pub struct MockImageStore {
    failing: HashSet<String>,
    delay: Option<Duration>,
    pub uploads: AtomicUsize,
    pub uploaded_ids: Mutex<Vec<String>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            delay: None,
            uploads: AtomicUsize::new(0),
            uploaded_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Keep each upload in flight for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(
        &self,
        file: &CandidateFile,
        auth: &UploadAuth,
    ) -> Result<RemoteUploadResult, ClientError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        // Let sibling uploads interleave.
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        if self.failing.contains(&file.name) {
            return Err(ClientError::Http {
                status: 500,
                message: "upload failed".into(),
            });
        }

        let file_id = format!("file-{}-{}", file.name, auth.token);
        self.uploaded_ids.lock().unwrap().push(file_id.clone());
        Ok(RemoteUploadResult {
            url: format!("https://img/{}", file.name),
            file_id,
            name: file.name.clone(),
            thumbnail_url: format!("https://img/{}", file.name),
        })
    }
}

pub fn png(name: &str, size: usize) -> CandidateFile {
    CandidateFile::new(name, "image/png", vec![0u8; size])
}
