use serde::Serialize;

/// Message shown whenever any part of a batch fails.
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload files. Please try again.";

/// Shown when upload is requested with nothing staged.
pub const NOTHING_SELECTED_MESSAGE: &str = "Please select files to upload";

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Files uploaded successfully!";

/// UI-visible upload state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    Selecting { files: usize },
    Uploading { files: usize },
    Success { message: String },
    Error { message: String },
}

impl UploadState {
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadAction {
    /// A batch passed validation and was staged.
    Selected { count: usize },
    /// A batch was refused; carries the first failing file's message.
    SelectionRejected { message: String },
    Cleared,
    NothingToUpload,
    UploadStarted { count: usize },
    UploadFailed,
    Registered { message: Option<String> },
    RegistrationFailed,
}

/// Pure transition function for the upload state machine.
pub fn reduce(state: &UploadState, action: UploadAction) -> UploadState {
    match action {
        UploadAction::Selected { count: 0 } => UploadState::Idle,
        UploadAction::Selected { count } => UploadState::Selecting { files: count },
        UploadAction::SelectionRejected { message } => UploadState::Error { message },
        UploadAction::Cleared => UploadState::Idle,
        UploadAction::NothingToUpload => UploadState::Error {
            message: NOTHING_SELECTED_MESSAGE.to_string(),
        },
        UploadAction::UploadStarted { count } => match state {
            UploadState::Uploading { .. } => state.clone(),
            _ => UploadState::Uploading { files: count },
        },
        UploadAction::UploadFailed | UploadAction::RegistrationFailed => UploadState::Error {
            message: UPLOAD_FAILED_MESSAGE.to_string(),
        },
        UploadAction::Registered { message } => UploadState::Success {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UPLOAD_SUCCESS_MESSAGE.to_string()),
        },
    }
}
