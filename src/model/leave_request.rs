use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// A submitted leave request as stored by the backend.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "category_id": 1,
    "start_date": "2026-01-01",
    "end_date": "2026-01-03",
    "is_half_day": false,
    "day_count": 3.0,
    "reason": "family event",
    "approver_id": 7,
    "status": "pending",
    "created_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub category_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub is_half_day: bool,
    pub day_count: f64,
    pub reason: String,
    pub approver_id: u64,
    #[schema(value_type = String)]
    pub status: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn status(&self) -> Option<LeaveStatus> {
        self.status.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_lowercase() {
        assert_eq!(LeaveStatus::Approved.as_ref(), "approved");
        assert_eq!("pending".parse::<LeaveStatus>().unwrap(), LeaveStatus::Pending);
        assert!("cancelled".parse::<LeaveStatus>().is_err());
    }
}
