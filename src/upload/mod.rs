//! Prescription upload pipeline: validate → upload to the image store → register.

mod orchestrator;
mod state;

pub use orchestrator::*;
pub use state::*;

use thiserror::Error;

use crate::error::ClientError;
use crate::validation::FileRejection;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please select files to upload")]
    NothingStaged,

    #[error("An upload is already in progress")]
    InProgress,

    #[error("{file}: {reason}")]
    Rejected { file: String, reason: FileRejection },

    #[error("{failed} of {total} uploads failed")]
    Aggregate {
        failed: usize,
        total: usize,
        #[source]
        first: ClientError,
    },

    #[error("Prescription registration failed: {0}")]
    Registration(#[source] ClientError),

    #[error("No uploaded files are waiting for registration")]
    NoPendingRegistration,
}

impl UploadError {
    /// Message for the upload panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::NothingStaged => NOTHING_SELECTED_MESSAGE.to_string(),
            Self::Rejected { reason, .. } => reason.to_string(),
            Self::Aggregate { .. } | Self::Registration(_) => UPLOAD_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
