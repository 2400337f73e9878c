use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Casual Leave",
    "without_pay": false
}))]
pub struct LeaveCategory {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Casual Leave")]
    pub name: String,

    /// Categories flagged without pay skip the balance check
    #[schema(example = false)]
    pub without_pay: bool,
}
