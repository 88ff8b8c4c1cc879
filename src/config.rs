use std::time::Duration;

use crate::error::ClientError;

/// Application-level constants
pub const APP_NAME: &str = "Carelog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest prescription image accepted for upload (2MB).
/// The upload hint shown to users is derived from this value.
pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;

/// Fixed per-request timeout applied to every HTTP call.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Image store folder that receives prescription uploads.
pub const UPLOAD_FOLDER: &str = "/medical-prescriptions";

/// Tags attached to every prescription upload.
pub const UPLOAD_TAGS: &[&str] = &["prescription"];

/// ImageKit's public upload endpoint.
pub const DEFAULT_IMAGEKIT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";

const ENV_API_BASE_URL: &str = "CARELOG_API_BASE_URL";
const ENV_IMAGEKIT_PUBLIC_KEY: &str = "CARELOG_IMAGEKIT_PUBLIC_KEY";
const ENV_IMAGEKIT_UPLOAD_URL: &str = "CARELOG_IMAGEKIT_UPLOAD_URL";
const ENV_MAX_UPLOAD_BYTES: &str = "CARELOG_MAX_UPLOAD_BYTES";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "carelog_lib=info,warn".to_string()
}

/// Runtime configuration for the backend and image store clients.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend REST base URL, without trailing slash.
    pub api_base_url: String,
    /// ImageKit public key sent with every upload.
    pub imagekit_public_key: String,
    /// ImageKit upload endpoint.
    pub imagekit_upload_url: String,
    pub max_upload_bytes: u64,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_base_url: &str, imagekit_public_key: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            imagekit_public_key: imagekit_public_key.to_string(),
            imagekit_upload_url: DEFAULT_IMAGEKIT_UPLOAD_URL.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_upload_url(mut self, url: &str) -> Self {
        self.imagekit_upload_url = url.to_string();
        self
    }

    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ClientError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Could not read .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ClientError::Config(format!("{ENV_API_BASE_URL} is not set")))?;
        let public_key = lookup(ENV_IMAGEKIT_PUBLIC_KEY).unwrap_or_default();

        let mut config = Self::new(base_url.trim(), public_key.trim());

        if let Some(url) = lookup(ENV_IMAGEKIT_UPLOAD_URL).filter(|v| !v.trim().is_empty()) {
            config.imagekit_upload_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{ENV_MAX_UPLOAD_BYTES} must be a byte count, got {raw:?}"))
            })?;
        }

        Ok(config)
    }

    /// Join a backend path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_name_is_carelog() {
        assert_eq!(APP_NAME, "Carelog");
    }

    #[test]
    fn max_upload_is_two_megabytes() {
        assert_eq!(MAX_UPLOAD_BYTES, 2_097_152);
    }

    #[test]
    fn new_trims_trailing_slash_and_applies_defaults() {
        let config = ClientConfig::new("https://api.example.com/", "pk_test");
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.imagekit_upload_url, DEFAULT_IMAGEKIT_UPLOAD_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_upload_bytes, MAX_UPLOAD_BYTES);
    }

    #[test]
    fn endpoint_joins_paths() {
        let config = ClientConfig::new("https://api.example.com", "");
        assert_eq!(config.endpoint("/auth/login"), "https://api.example.com/auth/login");
        assert_eq!(config.endpoint("imagekit/auth"), "https://api.example.com/imagekit/auth");
    }

    #[test]
    fn lookup_requires_base_url() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn lookup_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CARELOG_API_BASE_URL", "http://localhost:8080/"),
            ("CARELOG_IMAGEKIT_PUBLIC_KEY", "pk_live"),
            ("CARELOG_IMAGEKIT_UPLOAD_URL", "http://localhost:9000/upload"),
            ("CARELOG_MAX_UPLOAD_BYTES", "5242880"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.imagekit_public_key, "pk_live");
        assert_eq!(config.imagekit_upload_url, "http://localhost:9000/upload");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn lookup_rejects_bad_size() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            ("CARELOG_API_BASE_URL", "http://localhost:8080"),
            ("CARELOG_MAX_UPLOAD_BYTES", "two megs"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
