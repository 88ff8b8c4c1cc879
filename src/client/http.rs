use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::{
    BackendApi, LOGIN_PATH, RECORDS_PATH, REGISTER_PATH, REGISTER_PRESCRIPTION_PATH,
    UPLOAD_AUTH_PATH,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::{
    Acknowledgement, ApiResponse, AuthResponse, CreateAccountData, ErrorBody, LoginCredentials,
    MedicalRecord, RegistrationPayload, UploadAuth,
};
use crate::session::SessionContext;

/// Backend client over reqwest. Every request carries the session's bearer
/// token when one is held; a 401 drops the token.
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
    session: Arc<SessionContext>,
}

impl HttpBackend {
    pub fn new(config: ClientConfig, session: Arc<SessionContext>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.config.endpoint(path));
        match self.session.bearer() {
            Some(bearer) => builder.header(reqwest::header::AUTHORIZATION, bearer),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let timeout_secs = self.config.request_timeout.as_secs();
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, timeout_secs))?;

        let status = response.status();
        tracing::debug!(path, status = status.as_u16(), "Backend responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_default();

            if status == StatusCode::UNAUTHORIZED {
                // Bad credentials on the auth endpoints keep the backend's message.
                if is_credential_path(path) {
                    self.session.clear();
                } else {
                    self.session.expire();
                    return Err(ClientError::Unauthorized);
                }
            }

            tracing::warn!(path, status = status.as_u16(), message = %message, "Backend request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(e, timeout_secs))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(path, error = %e, "Backend response did not match schema");
            ClientError::Decode(format!("{path}: {e}"))
        })
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let envelope: ApiResponse<T> = self.send(path, builder).await?;
        if !envelope.success {
            return Err(ClientError::Rejected(envelope.message.unwrap_or_default()));
        }
        Ok(envelope.data)
    }
}

fn is_credential_path(path: &str) -> bool {
    path == LOGIN_PATH || path == REGISTER_PATH
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ClientError> {
        let builder = self.request(Method::POST, LOGIN_PATH).json(credentials);
        self.send_envelope(LOGIN_PATH, builder).await
    }

    async fn register(&self, data: &CreateAccountData) -> Result<AuthResponse, ClientError> {
        let builder = self.request(Method::POST, REGISTER_PATH).json(data);
        self.send_envelope(REGISTER_PATH, builder).await
    }

    async fn fetch_records(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<MedicalRecord>, ClientError> {
        let builder = self
            .request(Method::GET, RECORDS_PATH)
            .query(&[("skip", skip), ("limit", limit)]);
        self.send_envelope(RECORDS_PATH, builder).await
    }

    async fn upload_auth(&self) -> Result<UploadAuth, ClientError> {
        let builder = self.request(Method::GET, UPLOAD_AUTH_PATH);
        self.send(UPLOAD_AUTH_PATH, builder).await
    }

    async fn register_prescription(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<String, ClientError> {
        let builder = self
            .request(Method::POST, REGISTER_PRESCRIPTION_PATH)
            .json(payload);
        let ack: Acknowledgement = self.send(REGISTER_PRESCRIPTION_PATH, builder).await?;
        if !ack.success {
            return Err(ClientError::Rejected(ack.message.unwrap_or_default()));
        }
        Ok(ack.message.unwrap_or_default())
    }
}
