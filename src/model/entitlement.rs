use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Allocation and usage of one leave category for one employee, in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EntitlementRecord {
    #[schema(example = 1)]
    pub category_id: u64,

    #[schema(example = 12.0)]
    pub allocated: f64,

    #[schema(example = 1.5)]
    pub used: f64,
}

impl EntitlementRecord {
    pub fn balance(&self) -> f64 {
        self.allocated - self.used
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntitlementBalance {
    #[schema(example = 1)]
    pub category_id: u64,
    #[schema(example = 12.0)]
    pub allocated: f64,
    #[schema(example = 1.5)]
    pub used: f64,
    #[schema(example = 10.5)]
    pub balance: f64,
}

impl From<&EntitlementRecord> for EntitlementBalance {
    fn from(record: &EntitlementRecord) -> Self {
        Self {
            category_id: record.category_id,
            allocated: record.allocated,
            used: record.used,
            balance: record.balance(),
        }
    }
}
