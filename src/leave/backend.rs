use async_trait::async_trait;
use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

use crate::leave::payload::NormalizedRequest;
use crate::model::entitlement::EntitlementRecord;
use crate::model::leave_category::LeaveCategory;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubmissionReceipt {
    #[schema(example = "42")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Display)]
pub enum BackendError {
    #[display(fmt = "database error: {}", _0)]
    Database(String),
    #[display(fmt = "backend unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for BackendError {}

impl From<sqlx::Error> for BackendError {
    fn from(e: sqlx::Error) -> Self {
        let message = e.to_string();
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                BackendError::Unavailable(message)
            }
            _ => BackendError::Database(message),
        }
    }
}

/// Resource collaborator the leave engine reads from and submits to.
#[async_trait]
pub trait LeaveBackend: Send + Sync {
    async fn fetch_leave_categories(
        &self,
        employee_id: u64,
    ) -> Result<Vec<LeaveCategory>, BackendError>;

    async fn fetch_entitlements(
        &self,
        employee_id: u64,
    ) -> Result<Vec<EntitlementRecord>, BackendError>;

    async fn submit_request(
        &self,
        request: &NormalizedRequest,
    ) -> Result<SubmissionReceipt, BackendError>;
}
