use derive_more::Display;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use strum::AsRefStr;
use utoipa::ToSchema;

use crate::leave::day_counter::compute_days;
use crate::leave::draft::DraftRequest;
use crate::leave::entitlement::EntitlementResolver;

/// Balance figures shown next to the form while the user edits it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "current_balance": 11.0,
    "requested_days": 1.0,
    "remaining_balance": 10.0,
    "is_submittable": true
}))]
pub struct ComputedBalance {
    pub current_balance: f64,
    pub requested_days: f64,
    pub remaining_balance: f64,
    pub is_submittable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValidationError {
    #[display(fmt = "Please select a leave category")]
    MissingCategory,
    #[display(fmt = "Please select a from date")]
    MissingFromDate,
    #[display(fmt = "Please select a to date")]
    MissingToDate,
    #[display(fmt = "To date cannot be before from date")]
    InvertedRange,
    #[display(fmt = "Please select an approver")]
    MissingApprover,
    #[display(
        fmt = "Insufficient balance: {} day(s) requested, {} available",
        requested_days,
        current_balance
    )]
    InsufficientBalance {
        current_balance: f64,
        requested_days: f64,
        remaining_balance: f64,
    },
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 3)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        match self {
            ValidationError::InsufficientBalance {
                current_balance,
                requested_days,
                remaining_balance,
            } => state.serialize_field(
                "balance",
                &ComputedBalance {
                    current_balance: *current_balance,
                    requested_days: *requested_days,
                    remaining_balance: *remaining_balance,
                    is_submittable: false,
                },
            )?,
            _ => state.skip_field("balance")?,
        }
        state.end()
    }
}

impl ValidationError {
    /// Stable identifier clients switch on.
    pub fn code(&self) -> &str {
        self.as_ref()
    }
}

/// Live balance for the draft as it stands.
pub fn recompute_display(draft: &DraftRequest, resolver: &EntitlementResolver) -> ComputedBalance {
    let current_balance = draft
        .category
        .as_ref()
        .map(|c| resolver.balance(c.id))
        .unwrap_or(0.0);
    let requested_days = compute_days(draft.from_date, draft.to_date, draft.is_half_day);
    let remaining_balance = current_balance - requested_days;
    let without_pay = draft.category.as_ref().is_some_and(|c| c.without_pay);

    ComputedBalance {
        current_balance,
        requested_days,
        remaining_balance,
        is_submittable: without_pay || remaining_balance >= 0.0,
    }
}

/// Checks the draft in a fixed order and reports the first failing rule.
pub fn validate(draft: &DraftRequest, resolver: &EntitlementResolver) -> Result<(), ValidationError> {
    let category = draft
        .category
        .as_ref()
        .ok_or(ValidationError::MissingCategory)?;
    let from = draft.from_date.ok_or(ValidationError::MissingFromDate)?;
    let to = draft.to_date.ok_or(ValidationError::MissingToDate)?;

    if to < from {
        return Err(ValidationError::InvertedRange);
    }

    if draft.approver.is_none() {
        return Err(ValidationError::MissingApprover);
    }

    if !category.without_pay {
        let balance = recompute_display(draft, resolver);
        if balance.remaining_balance < 0.0 {
            return Err(ValidationError::InsufficientBalance {
                current_balance: balance.current_balance,
                requested_days: balance.requested_days,
                remaining_balance: balance.remaining_balance,
            });
        }
    }

    Ok(())
}
