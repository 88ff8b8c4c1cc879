//! Upload candidates: local files staged for a prescription upload.

use std::path::Path;

use crate::validation::{validate_medical_file, FileRejection};

/// Extensions the file picker offers (`.png,.jpg,.jpeg`).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A locally selected file held in memory until it is uploaded or cleared.
#[derive(Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: sanitize_filename(name),
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    /// Read a file from disk. The MIME type comes from magic bytes,
    /// falling back to the extension when the header is not recognised.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let mime_type = detect_mime(&bytes)
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(path)
                    .first_raw()
                    .unwrap_or("application/octet-stream")
                    .to_string()
            });

        tracing::debug!(file = %name, mime = %mime_type, size = bytes.len(), "Loaded upload candidate");
        Ok(Self::new(name, &mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn validate(&self, max_bytes: u64) -> Result<(), FileRejection> {
        validate_medical_file(&self.mime_type, self.size(), max_bytes)
    }
}

impl std::fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Detect an image type from its first bytes. Magic bytes beat extensions.
pub fn detect_mime(header: &[u8]) -> Option<&'static str> {
    match header {
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x25, 0x50, 0x44, 0x46, ..] => Some("application/pdf"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Some("image/tiff"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ if header.len() >= 12 && &header[4..8] == b"ftyp" => Some("image/heic"),
        _ => None,
    }
}

/// Whether the picker would offer this file name.
pub fn accepts_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Strip path components and NUL bytes, capped at 255 chars.
pub fn sanitize_filename(original: &str) -> String {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let clean: String = name.chars().filter(|c| *c != '\0').take(255).collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}
