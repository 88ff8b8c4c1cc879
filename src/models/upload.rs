use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Single-use signed parameters issued by `GET /imagekit/auth`.
#[derive(Clone, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct UploadAuth {
    pub signature: String,
    pub token: String,
    /// Unix timestamp (seconds) after which the signature is void.
    pub expire: i64,
}

impl std::fmt::Debug for UploadAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadAuth")
            .field("expire", &self.expire)
            .finish_non_exhaustive()
    }
}

/// What the image store returns per uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUploadResult {
    pub url: String,
    pub file_id: String,
    pub name: String,
    pub thumbnail_url: String,
}

/// Raw upload response; `thumbnailUrl` is optional on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUploadResponse {
    pub url: String,
    pub file_id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<RawUploadResponse> for RemoteUploadResult {
    fn from(raw: RawUploadResponse) -> Self {
        let thumbnail_url = raw
            .thumbnail_url
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| raw.url.clone());
        Self {
            url: raw.url,
            file_id: raw.file_id,
            name: raw.name,
            thumbnail_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetail {
    pub url: String,
    pub file_id: String,
    pub name: String,
}

/// Body of `POST /medicine/uploadMedicalPrescription`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub prescription_urls: Vec<String>,
    pub file_details: Vec<FileDetail>,
}

impl RegistrationPayload {
    /// One entry per upload, in the order given.
    pub fn from_results(results: &[RemoteUploadResult]) -> Self {
        Self {
            prescription_urls: results.iter().map(|r| r.url.clone()).collect(),
            file_details: results
                .iter()
                .map(|r| FileDetail {
                    url: r.url.clone(),
                    file_id: r.file_id.clone(),
                    name: r.name.clone(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prescription_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prescription_urls.is_empty()
    }

    /// Image store ids of every file in the payload.
    pub fn file_ids(&self) -> Vec<String> {
        self.file_details.iter().map(|d| d.file_id.clone()).collect()
    }
}
