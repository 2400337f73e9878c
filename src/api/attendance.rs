use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::attendance::{Attendance, GeoPoint};
use crate::report::{AttendanceSummary, DateRangeQuery, summarize_attendance};
use crate::utils::pagination::{AttendancePage, Pagination};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, date, check_in, check_out, latitude, longitude, address,
    out_latitude, out_longitude, out_address
"#;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
    #[schema(example = "2024-03-01", value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2024-03-31", value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

fn ensure_valid(point: &GeoPoint) -> Result<(), ApiError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid coordinates".into()))
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = GeoPoint,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Invalid coordinates"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    location: web::Json<GeoPoint>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;
    ensure_valid(&location)?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, check_in, latitude, longitude, address)
        VALUES (?, CURDATE(), CURTIME(), ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.address.as_deref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Checked in successfully"
        }))),

        Err(e) => {
            // Duplicate check-in for same day
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(ApiError::Conflict("Already checked in today".into()));
                }
            }

            tracing::error!(error = %e, employee_id, "Check-in failed");
            Err(ApiError::Internal)
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = GeoPoint,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "Invalid coordinates"),
        (status = 409, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    location: web::Json<GeoPoint>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;
    ensure_valid(&location)?;

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = CURTIME(), out_latitude = ?, out_longitude = ?, out_address = ?
        WHERE employee_id = ?
        AND date = CURDATE()
        AND check_out IS NULL
        "#,
    )
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.address.as_deref())
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict("No active check-in found for today".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Caller's attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance", body = AttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;
    let pagination = Pagination::new(query.page, query.per_page);

    // MySQL DATE range; NaiveDate::default() is 1970-01-01
    let from = query.from.unwrap_or_default();
    let to = query
        .to
        .or_else(|| NaiveDate::from_ymd_opt(9999, 12, 31))
        .unwrap_or_default();

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE employee_id = ? AND date BETWEEN ? AND ?",
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool.get_ref())
    .await?;

    let sql = format!(
        r#"
        SELECT {}
        FROM attendance
        WHERE employee_id = ?
        AND date BETWEEN ? AND ?
        ORDER BY date DESC
        LIMIT ? OFFSET ?
        "#,
        ATTENDANCE_COLUMNS
    );
    let records = sqlx::query_as::<_, Attendance>(&sql)
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .bind(pagination.per_page)
        .bind(pagination.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(pagination.into_page(records, total)))
}

/// Attendance report summary over a date range
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Summary; defaults to the current month", body = AttendanceSummary),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.require_employee()?;
    let (from, to) = query
        .resolve(Local::now().date_naive())
        .map_err(ApiError::BadRequest)?;

    let sql = format!(
        "SELECT {} FROM attendance WHERE employee_id = ? AND date BETWEEN ? AND ?",
        ATTENDANCE_COLUMNS
    );
    let records = sqlx::query_as::<_, Attendance>(&sql)
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(summarize_attendance(&records, from, to, config.late_after)))
}
