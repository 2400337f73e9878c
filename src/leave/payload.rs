use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::leave::day_counter::compute_days;
use crate::leave::draft::DraftRequest;
use crate::leave::validator::ValidationError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Backend-ready leave request. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 1000,
    "category_id": 1,
    "from_date": "2024-03-05",
    "to_date": "2024-03-05",
    "is_half_day": 1,
    "day_count": 0.5,
    "reason": "",
    "approver_id": 7,
    "attachments": []
}))]
pub struct NormalizedRequest {
    pub employee_id: u64,
    pub category_id: u64,
    pub from_date: String,
    pub to_date: String,
    /// `1` for a half-day request, `0` otherwise
    pub is_half_day: u8,
    pub day_count: f64,
    pub reason: String,
    pub approver_id: u64,
    pub attachments: Vec<String>,
}

/// Normalizes a draft that already passed validation.
///
/// Missing required fields still fail with the matching validation error
/// rather than producing a partial payload.
pub fn build_payload(
    employee_id: u64,
    draft: &DraftRequest,
) -> Result<NormalizedRequest, ValidationError> {
    let category = draft
        .category
        .as_ref()
        .ok_or(ValidationError::MissingCategory)?;
    let from = draft.from_date.ok_or(ValidationError::MissingFromDate)?;
    let to = draft.to_date.ok_or(ValidationError::MissingToDate)?;
    let approver_id = draft.approver.ok_or(ValidationError::MissingApprover)?;

    Ok(NormalizedRequest {
        employee_id,
        category_id: category.id,
        from_date: from.format(DATE_FORMAT).to_string(),
        to_date: to.format(DATE_FORMAT).to_string(),
        is_half_day: u8::from(draft.is_half_day),
        day_count: compute_days(Some(from), Some(to), draft.is_half_day),
        reason: draft.reason.trim().to_string(),
        approver_id,
        attachments: draft.attachments.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::draft::parse_calendar_date;
    use crate::model::leave_category::LeaveCategory;
    use chrono::NaiveDate;

    fn draft() -> DraftRequest {
        DraftRequest {
            category: Some(LeaveCategory {
                id: 3,
                name: "Casual Leave".into(),
                without_pay: false,
            }),
            from_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            to_date: NaiveDate::from_ymd_opt(2024, 3, 7),
            approver: Some(7),
            ..DraftRequest::default()
        }
    }

    #[test]
    fn formats_zero_padded_dates() {
        let payload = build_payload(1000, &draft()).unwrap();
        assert_eq!(payload.from_date, "2024-03-05");
        assert_eq!(payload.to_date, "2024-03-07");
        assert_eq!(payload.day_count, 3.0);
        assert_eq!(payload.is_half_day, 0);
    }

    #[test]
    fn timestamp_input_keeps_local_date() {
        let mut draft = draft();
        draft.from_date = parse_calendar_date("2024-03-05T00:15:00+09:00");
        draft.to_date = draft.from_date;
        let payload = build_payload(1000, &draft).unwrap();
        assert_eq!(payload.from_date, "2024-03-05");
    }

    #[test]
    fn defaults_optional_fields() {
        let mut draft = draft();
        draft.is_half_day = true;
        let payload = build_payload(1000, &draft).unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["reason"], "");
        assert_eq!(json["is_half_day"], 1);
        assert_eq!(json["attachments"], serde_json::json!([]));
        assert_eq!(payload.day_count, 0.5);
    }

    #[test]
    fn refuses_incomplete_draft() {
        let mut draft = draft();
        draft.approver = None;
        assert_eq!(build_payload(1000, &draft), Err(ValidationError::MissingApprover));
    }
}
