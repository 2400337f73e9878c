use std::sync::MutexGuard;

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::leave::backend::LeaveBackend;
use crate::leave::draft::{ActiveDropdown, DraftEdit, DraftRequest};
use crate::leave::gate::{SubmissionGate, SubmissionState};
use crate::leave::validator::ComputedBalance;
use crate::model::leave_category::LeaveCategory;
use crate::utils::draft_store::{DraftSession, DraftStore, SharedSession};

/// Everything the leave form binds to.
#[derive(Serialize, ToSchema)]
pub struct DraftView {
    #[schema(value_type = String, example = "3f1c2a0e-7d5b-4c1e-9a55-2b8f4d6e0c11")]
    pub id: Uuid,
    pub draft: DraftRequest,
    pub balance: ComputedBalance,
    #[schema(value_type = Object, example = json!({"state": "editing"}))]
    pub state: SubmissionState,
    pub can_submit: bool,
    pub active_dropdown: ActiveDropdown,
    /// Leave data could not be refreshed; figures may be outdated
    pub stale: bool,
    /// Why the last refresh failed, when `stale` is set
    pub stale_reason: Option<String>,
    pub categories: Vec<LeaveCategory>,
}

impl DraftView {
    fn new(id: Uuid, session: &DraftSession) -> Self {
        let gate = &session.gate;
        Self {
            id,
            draft: gate.draft().clone(),
            balance: gate.recompute_display(),
            state: gate.state().clone(),
            can_submit: gate.can_submit(),
            active_dropdown: session.dropdown,
            stale: gate.is_stale(),
            stale_reason: gate.refresh_error().map(ToString::to_string),
            categories: gate.categories().to_vec(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct DropdownReq {
    #[schema(example = "category")]
    pub dropdown: ActiveDropdown,
}

fn lock(session: &SharedSession) -> Result<MutexGuard<'_, DraftSession>, ApiError> {
    session.lock().map_err(|_| {
        error!("Draft session lock poisoned");
        ApiError::Internal
    })
}

async fn find(
    auth: &AuthUser,
    store: &DraftStore,
    id: &Uuid,
) -> Result<SharedSession, ApiError> {
    let employee_id = auth.require_employee()?;
    store
        .get(employee_id, id)
        .await
        .ok_or(ApiError::DraftNotFound)
}

/// Open a new leave draft
#[utoipa::path(
    post,
    path = "/api/leave/drafts",
    responses(
        (status = 201, description = "Draft opened with current categories and balances", body = DraftView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
#[instrument(name = "open_draft", skip_all, fields(user_id = auth.user_id))]
pub async fn open_draft(
    auth: AuthUser,
    backend: web::Data<dyn LeaveBackend>,
    store: web::Data<DraftStore>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;

    let gate = SubmissionGate::open(employee_id, backend.get_ref()).await;
    let (id, session) = store.open(gate).await;
    info!(employee_id, draft_id = %id, "Leave draft opened");

    let view = DraftView::new(id, &*lock(&session)?);
    Ok(HttpResponse::Created().json(view))
}

/// Current state of a draft
#[utoipa::path(
    get,
    path = "/api/leave/drafts/{draft_id}",
    params(("draft_id" = String, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft state", body = DraftView),
        (status = 404, description = "Draft not found or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
pub async fn get_draft(
    auth: AuthUser,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = find(&auth, &store, &id).await?;
    let view = DraftView::new(id, &*lock(&session)?);
    Ok(HttpResponse::Ok().json(view))
}

/// Apply one field edit; the response carries the recomputed balance
#[utoipa::path(
    patch,
    path = "/api/leave/drafts/{draft_id}",
    params(("draft_id" = String, Path, description = "Draft id")),
    request_body(
        content = Object,
        description = "One field edit, tagged by field name",
        content_type = "application/json",
        example = json!({"field": "from_date", "value": "2024-03-11"})
    ),
    responses(
        (status = 200, description = "Edit applied", body = DraftView),
        (status = 400, description = "Unknown category or malformed edit"),
        (status = 404, description = "Draft not found or expired"),
        (status = 409, description = "Draft is being submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
pub async fn edit_draft(
    auth: AuthUser,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
    edit: web::Json<DraftEdit>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = find(&auth, &store, &id).await?;
    let edit = edit.into_inner();

    let mut session = lock(&session)?;
    let picker = edit.picker();
    session.gate.apply(edit)?;
    // picking a value closes its picker
    if picker.is_some_and(|p| p == session.dropdown) {
        session.dropdown = ActiveDropdown::None;
    }

    Ok(HttpResponse::Ok().json(DraftView::new(id, &session)))
}

/// Open, switch or close the draft's picker
#[utoipa::path(
    put,
    path = "/api/leave/drafts/{draft_id}/dropdown",
    params(("draft_id" = String, Path, description = "Draft id")),
    request_body = DropdownReq,
    responses(
        (status = 200, description = "Dropdown toggled", body = DraftView),
        (status = 404, description = "Draft not found or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
pub async fn toggle_dropdown(
    auth: AuthUser,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
    body: web::Json<DropdownReq>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = find(&auth, &store, &id).await?;

    let mut session = lock(&session)?;
    session.dropdown = session.dropdown.toggle(body.dropdown);

    Ok(HttpResponse::Ok().json(DraftView::new(id, &session)))
}

/// Re-fetch categories and balances for a draft
#[utoipa::path(
    post,
    path = "/api/leave/drafts/{draft_id}/refresh",
    params(("draft_id" = String, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft with refreshed data; `stale` stays true if the fetch failed", body = DraftView),
        (status = 404, description = "Draft not found or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
pub async fn refresh_draft(
    auth: AuthUser,
    backend: web::Data<dyn LeaveBackend>,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = find(&auth, &store, &id).await?;
    let employee_id = auth.require_employee()?;

    let entitlements = backend.fetch_entitlements(employee_id).await;
    let categories = backend.fetch_leave_categories(employee_id).await;

    let mut session = lock(&session)?;
    // a failed refresh is reported through the stale flag
    let _ = session.gate.apply_refresh(entitlements, categories);

    Ok(HttpResponse::Ok().json(DraftView::new(id, &session)))
}

/// Validate a draft without submitting it
#[utoipa::path(
    post,
    path = "/api/leave/drafts/{draft_id}/validate",
    params(("draft_id" = String, Path, description = "Draft id")),
    responses(
        (status = 200, description = "Draft is valid", body = ComputedBalance),
        (status = 422, description = "First failing validation rule", body = Object, example = json!({
            "message": "Please select an approver",
            "error": {"code": "missing_approver", "message": "Please select an approver"}
        })),
        (status = 404, description = "Draft not found or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
pub async fn validate_draft(
    auth: AuthUser,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = find(&auth, &store, &id).await?;

    let session = lock(&session)?;
    session.gate.validate().map_err(ApiError::Validation)?;

    Ok(HttpResponse::Ok().json(session.gate.recompute_display()))
}

/// Submit a draft
#[utoipa::path(
    post,
    path = "/api/leave/drafts/{draft_id}/submit",
    params(("draft_id" = String, Path, description = "Draft id")),
    responses(
        (status = 201, description = "Leave request submitted; the draft is discarded", body = Object, example = json!({
            "id": "42",
            "message": "Leave request submitted",
            "status": "pending"
        })),
        (status = 404, description = "Draft not found or expired"),
        (status = 409, description = "Submission already in progress"),
        (status = 422, description = "Draft failed validation"),
        (status = 502, description = "Backend rejected the submission; the draft is kept")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
#[instrument(name = "submit_draft", skip_all, fields(user_id = auth.user_id))]
pub async fn submit_draft(
    auth: AuthUser,
    backend: web::Data<dyn LeaveBackend>,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let session = find(&auth, &store, &id).await?;

    // the lock is released while the request is in flight; the gate's
    // Submitting state refuses a second submit meanwhile
    let payload = lock(&session)?.gate.begin_submit()?;
    let outcome = backend.submit_request(&payload).await;
    let receipt = lock(&session)?.gate.finish_submit(outcome)?;

    store.discard(&id).await;

    Ok(HttpResponse::Created().json(json!({
        "id": receipt.id,
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

/// Cancel a draft
#[utoipa::path(
    delete,
    path = "/api/leave/drafts/{draft_id}",
    params(("draft_id" = String, Path, description = "Draft id")),
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 404, description = "Draft not found or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Draft"
)]
pub async fn cancel_draft(
    auth: AuthUser,
    store: web::Data<DraftStore>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    find(&auth, &store, &id).await?;
    store.discard(&id).await;
    Ok(HttpResponse::NoContent().finish())
}
