use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::leave::backend::LeaveBackend;
use crate::leave::entitlement::EntitlementResolver;
use crate::model::entitlement::EntitlementBalance;
use crate::model::leave_category::LeaveCategory;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::report::{DateRangeQuery, LeaveCategorySummary, summarize_leave};
use crate::utils::pagination::{LeavePage, Pagination};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, category_id, start_date, end_date, is_half_day,
    day_count, reason, approver_id, status, created_at
"#;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID (HR/Admin only; employees always see their own)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
}

/// Leave categories the caller can request
#[utoipa::path(
    get,
    path = "/api/leave/categories",
    responses(
        (status = 200, description = "Leave categories", body = [LeaveCategory]),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Leave data unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_categories(
    auth: AuthUser,
    backend: web::Data<dyn LeaveBackend>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;
    let categories = backend.fetch_leave_categories(employee_id).await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// Caller's entitlement balances for the current cycle
#[utoipa::path(
    get,
    path = "/api/leave/balances",
    responses(
        (status = 200, description = "Balances per category", body = [EntitlementBalance]),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Leave data unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_balances(
    auth: AuthUser,
    backend: web::Data<dyn LeaveBackend>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;

    let mut resolver = EntitlementResolver::new(employee_id);
    resolver.refresh(backend.get_ref()).await?;

    let balances: Vec<EntitlementBalance> = resolver
        .records()
        .into_iter()
        .map(EntitlementBalance::from)
        .collect();
    Ok(HttpResponse::Ok().json(balances))
}

/// Paginated leave requests
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeavePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    let pagination = Pagination::new(query.page, query.per_page);

    // employees only ever see their own requests
    let employee_filter = if auth.role.can_review_leave() {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.into()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {} FROM leave_requests{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        LEAVE_COLUMNS, where_sql
    );
    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(pagination.per_page)
        .bind(pagination.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(pagination.into_page(leaves, total)))
}

/// Leave request details
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
    let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await?
        .filter(|leave| {
            auth.role.can_review_leave() || auth.employee_id == Some(leave.employee_id)
        })
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    Ok(HttpResponse::Ok().json(leave))
}

/// Approve a pending request; paid categories consume entitlement
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 409, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'approved'
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "Leave request not found or already processed".into(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE leave_entitlements e
        JOIN leave_requests r
            ON r.employee_id = e.employee_id
            AND r.category_id = e.category_id
            AND e.cycle_year = YEAR(r.start_date)
        JOIN leave_categories c ON c.id = r.category_id
        SET e.used = e.used + r.day_count
        WHERE r.id = ?
        AND c.without_pay = 0
        "#,
    )
    .bind(leave_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(leave_id, reviewer = auth.user_id, "Leave approved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/// Reject a pending request
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 409, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;
    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'rejected'
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "Leave request not found or already processed".into(),
        ));
    }

    tracing::info!(leave_id, reviewer = auth.user_id, "Leave rejected");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// Caller's leave days per category within a date range
#[utoipa::path(
    get,
    path = "/api/leave/summary",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Days per category; defaults to the current month", body = [LeaveCategorySummary]),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;
    let (from, to) = query
        .resolve(Local::now().date_naive())
        .map_err(ApiError::BadRequest)?;

    let sql = format!(
        r#"
        SELECT {}
        FROM leave_requests
        WHERE employee_id = ?
        AND start_date <= ?
        AND end_date >= ?
        "#,
        LEAVE_COLUMNS
    );
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(employee_id)
        .bind(to)
        .bind(from)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(summarize_leave(&requests, from, to)))
}
