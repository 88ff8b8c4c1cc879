use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures_util::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use super::state::{reduce, UploadAction, UploadState};
use super::UploadError;
use crate::client::BackendApi;
use crate::error::ClientError;
use crate::files::CandidateFile;
use crate::image_store::ImageStore;
use crate::models::{RegistrationPayload, RemoteUploadResult};
use crate::validation::format_file_size;

/// What the upload panel lists for each staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFileSummary {
    pub name: String,
    pub size: u64,
    pub size_label: String,
}

/// Coordinates a prescription upload batch.
///
/// Owns the staged selection, the UI-visible `UploadState` and the
/// upload-loading flag. A batch is all-or-nothing: one invalid file rejects
/// the selection, one failed remote upload fails the whole batch.
pub struct UploadOrchestrator {
    api: Arc<dyn BackendApi>,
    store: Arc<dyn ImageStore>,
    max_upload_bytes: u64,
    state: RwLock<UploadState>,
    staged: Mutex<Vec<Arc<CandidateFile>>>,
    /// Uploaded results whose registration failed, kept for a retry.
    pending: Mutex<Option<RegistrationPayload>>,
    uploading: AtomicBool,
}

/// Holds the upload-loading flag for the duration of a batch.
struct UploadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl UploadOrchestrator {
    pub fn new(api: Arc<dyn BackendApi>, store: Arc<dyn ImageStore>, max_upload_bytes: u64) -> Self {
        Self {
            api,
            store,
            max_upload_bytes,
            state: RwLock::new(UploadState::Idle),
            staged: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            uploading: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True from the start of a batch until registration settles.
    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    pub fn staged_files(&self) -> Vec<StagedFileSummary> {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|f| StagedFileSummary {
                name: f.name.clone(),
                size: f.size(),
                size_label: format_file_size(f.size()),
            })
            .collect()
    }

    pub fn has_pending_registration(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn dispatch(&self, action: UploadAction) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let next = reduce(&state, action);
        tracing::debug!(from = ?*state, to = ?next, "Upload state transition");
        *state = next;
    }

    /// Raise the loading flag and snapshot the staged batch. Both happen
    /// under the staged lock, which `select` and `clear` also hold.
    fn begin(&self) -> Result<(UploadingGuard<'_>, Vec<Arc<CandidateFile>>), UploadError> {
        let staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        self.uploading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| UploadError::InProgress)?;
        let guard = UploadingGuard {
            flag: &self.uploading,
        };
        Ok((guard, staged.clone()))
    }

    /// Drop the staged selection if it is still the batch that was uploaded.
    fn release_staged(&self, batch: &[Arc<CandidateFile>]) {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        let same_batch = staged.len() == batch.len()
            && staged.iter().zip(batch).all(|(a, b)| Arc::ptr_eq(a, b));
        if same_batch {
            staged.clear();
        } else {
            tracing::debug!(staged = staged.len(), "Selection changed during upload, keeping it");
        }
    }

    fn take_pending(&self) -> Option<RegistrationPayload> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Validate and stage a batch. The first invalid file rejects the whole
    /// batch; nothing from it is staged.
    pub fn select(&self, files: Vec<CandidateFile>) -> Result<usize, UploadError> {
        // Held until the batch is staged so no upload can start in between.
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_uploading() {
            return Err(UploadError::InProgress);
        }

        for file in &files {
            if let Err(reason) = file.validate(self.max_upload_bytes) {
                tracing::info!(file = %file.name, reason = %reason, "Selection rejected");
                self.dispatch(UploadAction::SelectionRejected {
                    message: reason.to_string(),
                });
                return Err(UploadError::Rejected {
                    file: file.name.clone(),
                    reason,
                });
            }
        }

        if let Some(orphaned) = self.take_pending() {
            log_orphaned(&orphaned.file_ids());
        }

        let count = files.len();
        *staged = files.into_iter().map(Arc::new).collect();
        self.dispatch(UploadAction::Selected { count });
        tracing::debug!(files = count, "Selection staged");
        Ok(count)
    }

    /// Drop the selection and any pending registration.
    pub fn clear(&self) -> Result<(), UploadError> {
        let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_uploading() {
            return Err(UploadError::InProgress);
        }
        staged.clear();
        if let Some(orphaned) = self.take_pending() {
            log_orphaned(&orphaned.file_ids());
        }
        self.dispatch(UploadAction::Cleared);
        Ok(())
    }

    /// Upload every staged file concurrently, then register the batch.
    /// Returns the success message shown to the user.
    pub async fn upload(&self) -> Result<String, UploadError> {
        let (_guard, files) = self.begin()?;
        if files.is_empty() {
            self.dispatch(UploadAction::NothingToUpload);
            return Err(UploadError::NothingStaged);
        }

        let batch_id = Uuid::new_v4();
        let total = files.len();
        self.dispatch(UploadAction::UploadStarted { count: total });
        tracing::info!(%batch_id, files = total, "Starting prescription upload");

        let outcomes = join_all(files.iter().map(|file| self.upload_one(file))).await;

        let mut uploaded = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (file, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Ok(result) => uploaded.push(result),
                Err(e) => {
                    tracing::warn!(%batch_id, file = %file.name, error = %e, "Remote upload failed");
                    failures.push(e);
                }
            }
        }

        let failed = failures.len();
        if let Some(first) = failures.into_iter().next() {
            log_orphaned(&uploaded.iter().map(|r| r.file_id.clone()).collect::<Vec<_>>());
            self.dispatch(UploadAction::UploadFailed);
            return Err(UploadError::Aggregate {
                failed,
                total,
                first,
            });
        }

        self.register(RegistrationPayload::from_results(&uploaded), &files, batch_id)
            .await
    }

    /// Resubmit the results of a batch whose registration failed,
    /// without uploading the files again.
    pub async fn retry_registration(&self) -> Result<String, UploadError> {
        let (_guard, _) = self.begin()?;
        let payload = self.take_pending().ok_or(UploadError::NoPendingRegistration)?;

        let batch_id = Uuid::new_v4();
        self.dispatch(UploadAction::UploadStarted {
            count: payload.len(),
        });
        tracing::info!(%batch_id, files = payload.len(), "Retrying prescription registration");
        self.register(payload, &[], batch_id).await
    }

    async fn upload_one(&self, file: &CandidateFile) -> Result<RemoteUploadResult, ClientError> {
        let auth = self.api.upload_auth().await?;
        self.store.upload(file, &auth).await
    }

    async fn register(
        &self,
        payload: RegistrationPayload,
        batch: &[Arc<CandidateFile>],
        batch_id: Uuid,
    ) -> Result<String, UploadError> {
        let result = self.api.register_prescription(&payload).await;
        // The selection is discarded whether or not registration succeeds.
        self.release_staged(batch);

        match result {
            Ok(message) => {
                self.dispatch(UploadAction::Registered {
                    message: Some(message),
                });
                tracing::info!(%batch_id, files = payload.len(), "Prescription registered");
                match self.state() {
                    UploadState::Success { message } => Ok(message),
                    _ => Ok(super::UPLOAD_SUCCESS_MESSAGE.to_string()),
                }
            }
            Err(e) => {
                tracing::warn!(%batch_id, error = %e, "Prescription registration failed, keeping uploads for retry");
                *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload);
                self.dispatch(UploadAction::RegistrationFailed);
                Err(UploadError::Registration(e))
            }
        }
    }
}

fn log_orphaned(file_ids: &[String]) {
    if !file_ids.is_empty() {
        tracing::warn!(
            orphaned = ?file_ids,
            "Remote files were uploaded but never registered"
        );
    }
}
