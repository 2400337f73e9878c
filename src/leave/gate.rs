use derive_more::Display;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::leave::backend::{BackendError, LeaveBackend, SubmissionReceipt};
use crate::leave::draft::{DraftEdit, DraftRequest};
use crate::leave::entitlement::EntitlementResolver;
use crate::leave::payload::{NormalizedRequest, build_payload};
use crate::leave::validator::{self, ComputedBalance, ValidationError};
use crate::model::entitlement::EntitlementRecord;
use crate::model::leave_category::LeaveCategory;

/// Where a draft is in its submission lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Editing,
    Validating,
    Rejected { error: ValidationError },
    Submitting,
    Succeeded { request_id: String },
    Failed { message: String },
}

impl SubmissionState {
    /// Failed counts as editing again; the error is only kept for display.
    pub fn accepts_submit(&self) -> bool {
        matches!(
            self,
            SubmissionState::Editing | SubmissionState::Rejected { .. } | SubmissionState::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum GateError {
    #[display(fmt = "{}", _0)]
    Rejected(ValidationError),
    #[display(fmt = "Unknown leave category {}", _0)]
    UnknownCategory(u64),
    #[display(fmt = "A submission for this draft is already in progress")]
    SubmissionInFlight,
    #[display(fmt = "This draft has already been submitted")]
    AlreadySubmitted,
    #[display(fmt = "Submission failed: {}", _0)]
    SubmissionFailed(String),
}

impl std::error::Error for GateError {}

/// Owns one draft together with the data it is checked against and drives
/// `Editing -> Validating -> Rejected | Submitting -> Succeeded | Failed`.
#[derive(Debug, Clone)]
pub struct SubmissionGate {
    employee_id: u64,
    draft: DraftRequest,
    categories: Vec<LeaveCategory>,
    categories_error: Option<BackendError>,
    resolver: EntitlementResolver,
    state: SubmissionState,
}

impl SubmissionGate {
    pub fn new(
        employee_id: u64,
        categories: Vec<LeaveCategory>,
        resolver: EntitlementResolver,
    ) -> Self {
        Self {
            employee_id,
            draft: DraftRequest::default(),
            categories,
            categories_error: None,
            resolver,
            state: SubmissionState::Editing,
        }
    }

    /// Loads categories and entitlements for a fresh draft. Fetch failures
    /// leave the gate usable with empty data and a stale flag.
    pub async fn open(employee_id: u64, backend: &dyn LeaveBackend) -> Self {
        let mut gate = Self::new(employee_id, Vec::new(), EntitlementResolver::new(employee_id));
        if let Err(e) = gate.refresh(backend).await {
            warn!(employee_id, error = %e, "Draft opened without fresh leave data");
        }
        gate
    }

    pub fn employee_id(&self) -> u64 {
        self.employee_id
    }

    pub fn draft(&self) -> &DraftRequest {
        &self.draft
    }

    pub fn categories(&self) -> &[LeaveCategory] {
        &self.categories
    }

    pub fn resolver(&self) -> &EntitlementResolver {
        &self.resolver
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// True when the last refresh of categories or entitlements failed.
    pub fn is_stale(&self) -> bool {
        self.categories_error.is_some() || self.resolver.is_stale()
    }

    /// Error from the last failed refresh, categories first.
    pub fn refresh_error(&self) -> Option<&BackendError> {
        self.categories_error
            .as_ref()
            .or_else(|| self.resolver.last_error())
    }

    pub fn recompute_display(&self) -> ComputedBalance {
        validator::recompute_display(&self.draft, &self.resolver)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validator::validate(&self.draft, &self.resolver)
    }

    pub fn build_payload(&self) -> Result<NormalizedRequest, ValidationError> {
        build_payload(self.employee_id, &self.draft)
    }

    /// Whether the submit affordance should be enabled right now.
    pub fn can_submit(&self) -> bool {
        self.state.accepts_submit() && self.recompute_display().is_submittable
    }

    pub fn apply(&mut self, edit: DraftEdit) -> Result<ComputedBalance, GateError> {
        self.ensure_editable()?;

        match edit {
            DraftEdit::Category(None) => self.draft.set_category(None),
            DraftEdit::Category(Some(id)) => {
                let category = self
                    .categories
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                    .ok_or(GateError::UnknownCategory(id))?;
                self.draft.set_category(Some(category));
            }
            other => self.draft.apply_field(other),
        }

        if !matches!(self.state, SubmissionState::Editing) {
            self.state = SubmissionState::Editing;
        }

        Ok(self.recompute_display())
    }

    /// Re-fetches entitlements and categories. Each keeps its previous value
    /// when its fetch fails; the first error is returned.
    pub async fn refresh(&mut self, backend: &dyn LeaveBackend) -> Result<(), BackendError> {
        let entitlements = backend.fetch_entitlements(self.employee_id).await;
        let categories = backend.fetch_leave_categories(self.employee_id).await;
        self.apply_refresh(entitlements, categories)
    }

    pub fn apply_refresh(
        &mut self,
        entitlements: Result<Vec<EntitlementRecord>, BackendError>,
        categories: Result<Vec<LeaveCategory>, BackendError>,
    ) -> Result<(), BackendError> {
        let entitlements = self.resolver.apply_fetch(entitlements);

        let categories = match categories {
            Ok(categories) => {
                self.categories = categories;
                self.categories_error = None;
                // the in-flight payload was built from the current draft
                if self.ensure_editable().is_ok() {
                    self.reselect_category();
                }
                Ok(())
            }
            Err(e) => {
                warn!(employee_id = self.employee_id, error = %e, "Category refresh failed");
                self.categories_error = Some(e.clone());
                Err(e)
            }
        };

        entitlements.and(categories)
    }

    /// Validates the draft and, when it passes, moves to `Submitting` and
    /// hands back the payload to send.
    pub fn begin_submit(&mut self) -> Result<NormalizedRequest, GateError> {
        match &self.state {
            SubmissionState::Submitting | SubmissionState::Validating => {
                return Err(GateError::SubmissionInFlight);
            }
            SubmissionState::Succeeded { .. } => return Err(GateError::AlreadySubmitted),
            _ => {}
        }

        self.state = SubmissionState::Validating;

        let payload = self.validate().and_then(|()| self.build_payload());
        match payload {
            Ok(payload) => {
                self.state = SubmissionState::Submitting;
                Ok(payload)
            }
            Err(error) => {
                debug!(employee_id = self.employee_id, code = error.code(), "Draft rejected");
                self.state = SubmissionState::Rejected { error };
                Err(GateError::Rejected(error))
            }
        }
    }

    /// Records the collaborator's answer for the submission started by
    /// [`begin_submit`](Self::begin_submit).
    pub fn finish_submit(
        &mut self,
        outcome: Result<SubmissionReceipt, BackendError>,
    ) -> Result<SubmissionReceipt, GateError> {
        if self.state != SubmissionState::Submitting {
            warn!(employee_id = self.employee_id, "Submission finished outside Submitting state");
        }

        match outcome {
            Ok(receipt) => {
                info!(
                    employee_id = self.employee_id,
                    request_id = %receipt.id,
                    "Leave request submitted"
                );
                self.draft = DraftRequest::default();
                self.state = SubmissionState::Succeeded {
                    request_id: receipt.id.clone(),
                };
                Ok(receipt)
            }
            Err(e) => {
                warn!(employee_id = self.employee_id, error = %e, "Leave request submission failed");
                let message = e.to_string();
                self.state = SubmissionState::Failed {
                    message: message.clone(),
                };
                Err(GateError::SubmissionFailed(message))
            }
        }
    }

    pub async fn submit(
        &mut self,
        backend: &dyn LeaveBackend,
    ) -> Result<SubmissionReceipt, GateError> {
        let payload = self.begin_submit()?;
        let outcome = backend.submit_request(&payload).await;
        self.finish_submit(outcome)
    }

    fn ensure_editable(&self) -> Result<(), GateError> {
        match self.state {
            SubmissionState::Submitting | SubmissionState::Validating => {
                Err(GateError::SubmissionInFlight)
            }
            SubmissionState::Succeeded { .. } => Err(GateError::AlreadySubmitted),
            _ => Ok(()),
        }
    }

    fn reselect_category(&mut self) {
        let Some(current) = self.draft.category.as_ref() else {
            return;
        };
        let refreshed = self.categories.iter().find(|c| c.id == current.id).cloned();
        if refreshed.is_none() {
            debug!(category_id = current.id, "Selected category no longer offered");
        }
        self.draft.set_category(refreshed);
    }
}
