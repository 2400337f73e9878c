use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::model::leave_category::LeaveCategory;

/// In-progress leave request a user is filling in.
///
/// Fields change only through [`DraftEdit`]; the draft is discarded on cancel
/// or once the submission succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DraftRequest {
    pub category: Option<LeaveCategory>,
    #[schema(value_type = Option<String>, format = "date", example = "2024-03-11")]
    pub from_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date", example = "2024-03-12")]
    pub to_date: Option<NaiveDate>,
    pub is_half_day: bool,
    pub reason: String,
    pub approver: Option<u64>,
    pub attachments: Vec<String>,
}

/// One user edit to a draft. `Category` carries an id that the gate resolves
/// against its catalog before calling [`DraftRequest::set_category`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DraftEdit {
    Category(Option<u64>),
    #[serde(deserialize_with = "calendar_date")]
    FromDate(Option<NaiveDate>),
    #[serde(deserialize_with = "calendar_date")]
    ToDate(Option<NaiveDate>),
    HalfDay(bool),
    Reason(String),
    Approver(Option<u64>),
    AddAttachment(String),
    RemoveAttachment(String),
}

impl DraftEdit {
    /// The dropdown this edit picks a value from, if any.
    pub fn picker(&self) -> Option<ActiveDropdown> {
        match self {
            DraftEdit::Category(_) => Some(ActiveDropdown::Category),
            DraftEdit::Approver(_) => Some(ActiveDropdown::Approver),
            DraftEdit::FromDate(_) => Some(ActiveDropdown::FromDate),
            DraftEdit::ToDate(_) => Some(ActiveDropdown::ToDate),
            _ => None,
        }
    }
}

impl DraftRequest {
    pub fn set_category(&mut self, category: Option<LeaveCategory>) {
        self.category = category;
    }

    /// Applies every edit except `Category`, which needs the catalog.
    pub(crate) fn apply_field(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Category(_) => {}
            DraftEdit::FromDate(date) => self.from_date = date,
            DraftEdit::ToDate(date) => self.to_date = date,
            DraftEdit::HalfDay(flag) => self.is_half_day = flag,
            DraftEdit::Reason(reason) => self.reason = reason,
            DraftEdit::Approver(approver) => self.approver = approver,
            DraftEdit::AddAttachment(file) => {
                if !self.attachments.contains(&file) {
                    self.attachments.push(file);
                }
            }
            DraftEdit::RemoveAttachment(file) => self.attachments.retain(|f| f != &file),
        }
    }
}

/// Picker currently open on the draft form. Only one can be open at a time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActiveDropdown {
    #[default]
    None,
    Category,
    Approver,
    FromDate,
    ToDate,
}

impl ActiveDropdown {
    /// Opening a picker closes whichever was open; opening the open one closes it.
    pub fn toggle(self, target: ActiveDropdown) -> ActiveDropdown {
        if self == target {
            ActiveDropdown::None
        } else {
            target
        }
    }

    pub fn is_open(self) -> bool {
        self != ActiveDropdown::None
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. A timestamp keeps its own
/// local calendar date; the offset is never applied.
fn calendar_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_calendar_date(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_tagged_edits() {
        let edit: DraftEdit =
            serde_json::from_value(json!({"field": "from_date", "value": "2024-03-05"})).unwrap();
        assert_eq!(edit, DraftEdit::FromDate(Some(d(2024, 3, 5))));

        let edit: DraftEdit =
            serde_json::from_value(json!({"field": "to_date", "value": null})).unwrap();
        assert_eq!(edit, DraftEdit::ToDate(None));

        let edit: DraftEdit =
            serde_json::from_value(json!({"field": "half_day", "value": true})).unwrap();
        assert_eq!(edit, DraftEdit::HalfDay(true));
    }

    #[test]
    fn timestamp_keeps_local_calendar_date() {
        // late evening east of UTC is still the previous day in UTC
        assert_eq!(parse_calendar_date("2024-03-05T01:30:00+06:00"), Some(d(2024, 3, 5)));
        assert_eq!(parse_calendar_date("2024-03-05T23:30:00-05:00"), Some(d(2024, 3, 5)));
        assert_eq!(parse_calendar_date("05/03/2024"), None);
    }

    #[test]
    fn rejects_garbage_dates() {
        let result: Result<DraftEdit, _> =
            serde_json::from_value(json!({"field": "from_date", "value": "soon"}));
        assert!(result.is_err());
    }

    #[test]
    fn attachments_are_deduplicated() {
        let mut draft = DraftRequest::default();
        draft.apply_field(DraftEdit::AddAttachment("uploads/a.pdf".into()));
        draft.apply_field(DraftEdit::AddAttachment("uploads/a.pdf".into()));
        draft.apply_field(DraftEdit::AddAttachment("uploads/b.png".into()));
        assert_eq!(draft.attachments.len(), 2);

        draft.apply_field(DraftEdit::RemoveAttachment("uploads/a.pdf".into()));
        assert_eq!(draft.attachments, vec!["uploads/b.png".to_string()]);
    }

    #[test]
    fn only_one_dropdown_open() {
        let open = ActiveDropdown::None.toggle(ActiveDropdown::Category);
        assert_eq!(open, ActiveDropdown::Category);

        let switched = open.toggle(ActiveDropdown::FromDate);
        assert_eq!(switched, ActiveDropdown::FromDate);

        let closed = switched.toggle(ActiveDropdown::FromDate);
        assert!(!closed.is_open());
    }
}
