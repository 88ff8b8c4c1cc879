//! Remote image store (ImageKit) client.
//!
//! Uploads use single-use signed parameters issued by the backend; the store
//! never sees the backend session token.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::config::{ClientConfig, UPLOAD_FOLDER, UPLOAD_TAGS};
use crate::error::ClientError;
use crate::files::CandidateFile;
use crate::models::{ErrorBody, RawUploadResponse, RemoteUploadResult, UploadAuth};

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(
        &self,
        file: &CandidateFile,
        auth: &UploadAuth,
    ) -> Result<RemoteUploadResult, ClientError>;
}

pub struct ImageKitStore {
    upload_url: String,
    public_key: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ImageKitStore {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            upload_url: config.imagekit_upload_url.clone(),
            public_key: config.imagekit_public_key.clone(),
            timeout_secs: config.request_timeout.as_secs(),
            client,
        })
    }

    fn form(&self, file: &CandidateFile, auth: &UploadAuth) -> Result<Form, ClientError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ClientError::Validation(format!("Invalid MIME type: {e}")))?;

        Ok(Form::new()
            .part("file", part)
            .text("fileName", file.name.clone())
            .text("publicKey", self.public_key.clone())
            .text("signature", auth.signature.clone())
            .text("token", auth.token.clone())
            .text("expire", auth.expire.to_string())
            .text("folder", UPLOAD_FOLDER)
            .text("tags", UPLOAD_TAGS.join(",")))
    }
}

#[async_trait]
impl ImageStore for ImageKitStore {
    async fn upload(
        &self,
        file: &CandidateFile,
        auth: &UploadAuth,
    ) -> Result<RemoteUploadResult, ClientError> {
        let form = self.form(file, auth)?;

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_default();
            tracing::warn!(file = %file.name, status = status.as_u16(), message = %message, "Image store rejected upload");
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(e, self.timeout_secs))?;
        let raw: RawUploadResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("image store upload: {e}")))?;

        tracing::debug!(file = %file.name, file_id = %raw.file_id, "Uploaded to image store");
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/upload")
    }

    fn auth() -> UploadAuth {
        UploadAuth {
            signature: "sig-1".into(),
            token: "one-time".into(),
            expire: 1_700_000_000,
        }
    }

    fn store(upload_url: &str) -> ImageKitStore {
        let config = ClientConfig::new("http://unused", "pk_test").with_upload_url(upload_url);
        ImageKitStore::new(&config).unwrap()
    }

    #[tokio::test]
    async fn upload_sends_signed_multipart_form() {
        let router = Router::new().route(
            "/upload",
            post(|mut multipart: Multipart| async move {
                let mut fields = HashMap::new();
                let mut file_len = 0;
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    if name == "file" {
                        assert_eq!(field.content_type(), Some("image/png"));
                        file_len = field.bytes().await.unwrap().len();
                    } else {
                        fields.insert(name, field.text().await.unwrap());
                    }
                }
                assert_eq!(file_len, 4);
                assert_eq!(fields["fileName"], "rx.png");
                assert_eq!(fields["publicKey"], "pk_test");
                assert_eq!(fields["signature"], "sig-1");
                assert_eq!(fields["token"], "one-time");
                assert_eq!(fields["expire"], "1700000000");
                assert_eq!(fields["folder"], "/medical-prescriptions");
                assert_eq!(fields["tags"], "prescription");
                Json(json!({
                    "url": "https://img/rx.png",
                    "fileId": "f-42",
                    "name": "rx.png",
                    "thumbnailUrl": "https://img/tr:n-thumb/rx.png"
                }))
            }),
        );
        let store = store(&spawn(router).await);
        let file = CandidateFile::new("rx.png", "image/png", vec![0x89, 0x50, 0x4E, 0x47]);

        let result = store.upload(&file, &auth()).await.unwrap();
        assert_eq!(result.url, "https://img/rx.png");
        assert_eq!(result.file_id, "f-42");
        assert_eq!(result.thumbnail_url, "https://img/tr:n-thumb/rx.png");
    }

    #[tokio::test]
    async fn expired_signature_is_http_error() {
        let router = Router::new().route(
            "/upload",
            post(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"message": "The signature has expired"})),
                )
            }),
        );
        let store = store(&spawn(router).await);
        let file = CandidateFile::new("rx.png", "image/png", vec![1]);

        let err = store.upload(&file, &auth()).await.unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 403, .. }));
        assert_eq!(err.backend_message(), Some("The signature has expired"));
    }

    #[tokio::test]
    async fn response_without_file_id_is_rejected() {
        let router = Router::new().route(
            "/upload",
            post(|| async { Json(json!({"url": "https://img/rx.png", "name": "rx.png"})) }),
        );
        let store = store(&spawn(router).await);
        let file = CandidateFile::new("rx.png", "image/png", vec![1]);

        let err = store.upload(&file, &auth()).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
