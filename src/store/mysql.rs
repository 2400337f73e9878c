use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::leave::backend::{BackendError, LeaveBackend, SubmissionReceipt};
use crate::leave::payload::NormalizedRequest;
use crate::model::entitlement::EntitlementRecord;
use crate::model::leave_category::LeaveCategory;

/// [`LeaveBackend`] over the `leave_categories`, `leave_entitlements` and
/// `leave_requests` tables.
#[derive(Clone)]
pub struct MySqlLeaveBackend {
    pool: MySqlPool,
}

impl MySqlLeaveBackend {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveBackend for MySqlLeaveBackend {
    async fn fetch_leave_categories(
        &self,
        employee_id: u64,
    ) -> Result<Vec<LeaveCategory>, BackendError> {
        sqlx::query_as::<_, LeaveCategory>(
            r#"
            SELECT id, name, without_pay
            FROM leave_categories
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch leave categories");
            BackendError::from(e)
        })
    }

    async fn fetch_entitlements(
        &self,
        employee_id: u64,
    ) -> Result<Vec<EntitlementRecord>, BackendError> {
        sqlx::query_as::<_, EntitlementRecord>(
            r#"
            SELECT category_id, allocated, used
            FROM leave_entitlements
            WHERE employee_id = ?
            AND cycle_year = YEAR(CURDATE())
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch entitlements");
            BackendError::from(e)
        })
    }

    async fn submit_request(
        &self,
        request: &NormalizedRequest,
    ) -> Result<SubmissionReceipt, BackendError> {
        let attachments = serde_json::to_string(&request.attachments)
            .map_err(|e| BackendError::Database(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, category_id, start_date, end_date, is_half_day,
                 day_count, reason, approver_id, attachments)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.category_id)
        .bind(&request.from_date)
        .bind(&request.to_date)
        .bind(request.is_half_day)
        .bind(request.day_count)
        .bind(&request.reason)
        .bind(request.approver_id)
        .bind(attachments)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                employee_id = request.employee_id,
                "Failed to create leave request"
            );
            BackendError::from(e)
        })?;

        Ok(SubmissionReceipt {
            id: result.last_insert_id().to_string(),
        })
    }
}
