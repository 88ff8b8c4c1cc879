//! Backend REST access.
//!
//! `BackendApi` is the seam the stores and the upload orchestrator depend on;
//! `HttpBackend` is the reqwest implementation.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{
    AuthResponse, CreateAccountData, LoginCredentials, MedicalRecord, RegistrationPayload,
    UploadAuth,
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const RECORDS_PATH: &str = "/medicine/usersMedicalData";
pub const UPLOAD_AUTH_PATH: &str = "/imagekit/auth";
pub const REGISTER_PRESCRIPTION_PATH: &str = "/medicine/uploadMedicalPrescription";

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ClientError>;

    async fn register(&self, data: &CreateAccountData) -> Result<AuthResponse, ClientError>;

    async fn fetch_records(&self, skip: u32, limit: u32)
        -> Result<Vec<MedicalRecord>, ClientError>;

    /// Fresh single-use signature for one image store upload.
    async fn upload_auth(&self) -> Result<UploadAuth, ClientError>;

    /// Returns the backend's acknowledgement message.
    async fn register_prescription(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<String, ClientError>;
}
