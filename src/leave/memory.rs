use std::sync::Mutex;

use async_trait::async_trait;

use crate::leave::backend::{BackendError, LeaveBackend, SubmissionReceipt};
use crate::leave::payload::NormalizedRequest;
use crate::model::entitlement::EntitlementRecord;
use crate::model::leave_category::LeaveCategory;

#[derive(Default)]
struct MemoryState {
    categories: Vec<LeaveCategory>,
    entitlements: Vec<EntitlementRecord>,
    submitted: Vec<NormalizedRequest>,
    fail_fetches: bool,
    fail_submits: bool,
}

/// In-process [`LeaveBackend`] for local runs and tests.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(self, categories: Vec<LeaveCategory>) -> Self {
        self.state().categories = categories;
        self
    }

    pub fn with_entitlements(self, entitlements: Vec<EntitlementRecord>) -> Self {
        self.set_entitlements(entitlements);
        self
    }

    pub fn set_categories(&self, categories: Vec<LeaveCategory>) {
        self.state().categories = categories;
    }

    pub fn set_entitlements(&self, entitlements: Vec<EntitlementRecord>) {
        self.state().entitlements = entitlements;
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.state().fail_fetches = fail;
    }

    pub fn fail_submits(&self, fail: bool) {
        self.state().fail_submits = fail;
    }

    pub fn submitted(&self) -> Vec<NormalizedRequest> {
        self.state().submitted.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LeaveBackend for MemoryBackend {
    async fn fetch_leave_categories(
        &self,
        _employee_id: u64,
    ) -> Result<Vec<LeaveCategory>, BackendError> {
        let state = self.state();
        if state.fail_fetches {
            return Err(BackendError::Unavailable("categories unavailable".into()));
        }
        Ok(state.categories.clone())
    }

    async fn fetch_entitlements(
        &self,
        _employee_id: u64,
    ) -> Result<Vec<EntitlementRecord>, BackendError> {
        let state = self.state();
        if state.fail_fetches {
            return Err(BackendError::Unavailable("entitlements unavailable".into()));
        }
        Ok(state.entitlements.clone())
    }

    async fn submit_request(
        &self,
        request: &NormalizedRequest,
    ) -> Result<SubmissionReceipt, BackendError> {
        let mut state = self.state();
        if state.fail_submits {
            return Err(BackendError::Database("insert rejected".into()));
        }
        state.submitted.push(request.clone());
        Ok(SubmissionReceipt {
            id: state.submitted.len().to_string(),
        })
    }
}
