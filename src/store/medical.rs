use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::client::BackendApi;
use crate::error::ClientError;
use crate::models::{sort_by_serial, MedicalRecord};

const FETCH_FAILED: &str = "Failed to fetch medical data";

pub const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MedicalState {
    pub records: Vec<MedicalRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MedicalAction {
    FetchStarted,
    Loaded(Vec<MedicalRecord>),
    FetchFailed(String),
    ClearError,
}

pub fn reduce(state: &MedicalState, action: MedicalAction) -> MedicalState {
    match action {
        MedicalAction::FetchStarted => MedicalState {
            loading: true,
            error: None,
            ..state.clone()
        },
        // A fetch replaces the list; pages are never appended.
        MedicalAction::Loaded(records) => MedicalState {
            records,
            loading: false,
            error: None,
        },
        MedicalAction::FetchFailed(message) => MedicalState {
            loading: false,
            error: Some(message),
            ..state.clone()
        },
        MedicalAction::ClearError => MedicalState {
            error: None,
            ..state.clone()
        },
    }
}

/// 1-based page position. The caller owns it; the store only sees skip/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn skip(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.limit)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.page.saturating_sub(1), self.limit)
    }
}

pub struct MedicalStore {
    state: RwLock<MedicalState>,
    api: Arc<dyn BackendApi>,
}

impl MedicalStore {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self {
            state: RwLock::new(MedicalState::default()),
            api,
        }
    }

    pub fn state(&self) -> MedicalState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn dispatch(&self, action: MedicalAction) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = reduce(&state, action);
    }

    /// Fetch one page of records, replacing the current list.
    /// On failure the previous list is kept and `error` is set.
    pub async fn fetch(&self, skip: u32, limit: u32) -> Result<Vec<MedicalRecord>, ClientError> {
        self.dispatch(MedicalAction::FetchStarted);
        match self.api.fetch_records(skip, limit).await {
            Ok(records) => {
                tracing::debug!(skip, limit, count = records.len(), "Medical records loaded");
                self.dispatch(MedicalAction::Loaded(records.clone()));
                Ok(records)
            }
            Err(e) => {
                tracing::warn!(skip, limit, error = %e, "Failed to fetch medical records");
                let message = e.backend_message().unwrap_or(FETCH_FAILED).to_string();
                self.dispatch(MedicalAction::FetchFailed(message));
                Err(e)
            }
        }
    }

    pub async fn fetch_page(&self, page: Page) -> Result<Vec<MedicalRecord>, ClientError> {
        self.fetch(page.skip(), page.limit).await
    }

    /// Records ordered for display by serial number.
    pub fn sorted_records(&self) -> Vec<MedicalRecord> {
        let mut records = self.state().records;
        sort_by_serial(&mut records);
        records
    }

    pub fn clear_error(&self) {
        self.dispatch(MedicalAction::ClearError);
    }
}
