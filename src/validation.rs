//! Prescription image validation and byte-size formatting.

use serde::Serialize;

use crate::config::MAX_UPLOAD_BYTES;

/// MIME types accepted for prescription uploads.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg"];

pub const TYPE_ERROR_MESSAGE: &str = "Please upload only PNG, JPG, or JPEG files.";

const SIZE_UNITS: &[&str] = &["Bytes", "KB", "MB"];

/// Why a file was refused. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("Please upload only PNG, JPG, or JPEG files.")]
    UnsupportedType { mime_type: String },

    #[error("File size should not exceed {}.", compact_size(.max_bytes))]
    TooLarge { size: u64, max_bytes: u64 },
}

/// Presentation-friendly outcome: `{is_valid, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), FileRejection>> for FileValidation {
    fn from(result: Result<(), FileRejection>) -> Self {
        match result {
            Ok(()) => Self {
                is_valid: true,
                error: None,
            },
            Err(rejection) => Self {
                is_valid: false,
                error: Some(rejection.to_string()),
            },
        }
    }
}

/// Check a candidate's type, then its size, against `max_bytes`.
pub fn validate_medical_file(
    mime_type: &str,
    size: u64,
    max_bytes: u64,
) -> Result<(), FileRejection> {
    let mime = mime_type.trim().to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(FileRejection::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }
    if size > max_bytes {
        return Err(FileRejection::TooLarge { size, max_bytes });
    }
    Ok(())
}

/// Same as [`validate_medical_file`] with the default limit.
pub fn validate(mime_type: &str, size: u64) -> FileValidation {
    validate_medical_file(mime_type, size, MAX_UPLOAD_BYTES).into()
}

/// Render a byte count as `Bytes`, `KB` or `MB` (base 1024, at most 2 decimals).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    // floor(log_1024(bytes)) without float rounding at exact powers
    let mut index = 0;
    while index + 1 < SIZE_UNITS.len() && bytes >= 1024u64.pow(index as u32 + 1) {
        index += 1;
    }
    let scaled = bytes as f64 / 1024u64.pow(index as u32) as f64;
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", trim_decimal(rounded), SIZE_UNITS[index])
}

/// `1.50` -> `1.5`, `1.00` -> `1`.
fn trim_decimal(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `2 MB` -> `2MB`, as used in user-facing limits.
fn compact_size(bytes: &u64) -> String {
    format_file_size(*bytes).replace(' ', "")
}

/// Hint shown next to the file picker, kept in step with the enforced limit.
pub fn upload_hint(max_bytes: u64) -> String {
    format!(
        "Supported formats: PNG, JPG, JPEG (Max {} each)",
        compact_size(&max_bytes)
    )
}
