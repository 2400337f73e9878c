//! Date-range summaries over attendance and leave records.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::leave::day_counter::{HALF_DAY, compute_days, overlap_days};
use crate::model::attendance::Attendance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// Inclusive reporting window; either bound defaults to the current month.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DateRangeQuery {
    #[schema(example = "2024-03-01", value_type = Option<String>, format = "date")]
    /// First day of the range
    pub from: Option<NaiveDate>,
    #[schema(example = "2024-03-31", value_type = Option<String>, format = "date")]
    /// Last day of the range
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), String> {
        let month_start = today.with_day(1).unwrap_or(today);
        let month_end = month_start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);

        let from = self.from.unwrap_or(month_start);
        let to = self.to.unwrap_or(month_end);
        if to < from {
            return Err("to cannot be before from".to_string());
        }
        Ok((from, to))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
    pub calendar_days: u32,
    pub days_present: u32,
    /// Checked in but never checked out
    pub days_incomplete: u32,
    pub late_arrivals: u32,
    pub total_hours: f64,
    pub average_hours: f64,
}

/// Aggregates the records dated inside `[from, to]`. Hours are counted only
/// for days with both a check-in and a later check-out.
pub fn summarize_attendance(
    records: &[Attendance],
    from: NaiveDate,
    to: NaiveDate,
    late_after: NaiveTime,
) -> AttendanceSummary {
    let mut summary = AttendanceSummary {
        from,
        to,
        calendar_days: compute_days(Some(from), Some(to), false) as u32,
        days_present: 0,
        days_incomplete: 0,
        late_arrivals: 0,
        total_hours: 0.0,
        average_hours: 0.0,
    };
    let mut completed = 0u32;

    for record in records.iter().filter(|r| r.date >= from && r.date <= to) {
        let Some(check_in) = record.check_in else {
            continue;
        };
        summary.days_present += 1;

        if check_in > late_after {
            summary.late_arrivals += 1;
        }

        match record.check_out {
            Some(check_out) if check_out > check_in => {
                summary.total_hours += (check_out - check_in).num_seconds() as f64 / 3600.0;
                completed += 1;
            }
            Some(_) => {}
            None => summary.days_incomplete += 1,
        }
    }

    if completed > 0 {
        summary.average_hours = summary.total_hours / completed as f64;
    }
    summary
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveCategorySummary {
    pub category_id: u64,
    pub approved_days: f64,
    pub pending_days: f64,
}

/// Leave days per category falling inside `[from, to]`; rejected requests
/// are ignored and multi-day requests are clipped to the window.
pub fn summarize_leave(
    requests: &[LeaveRequest],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<LeaveCategorySummary> {
    let mut by_category: BTreeMap<u64, LeaveCategorySummary> = BTreeMap::new();

    for request in requests {
        let approved = match request.status() {
            Some(LeaveStatus::Approved) => true,
            Some(LeaveStatus::Pending) => false,
            _ => continue,
        };
        let days = if request.is_half_day {
            if request.start_date >= from && request.start_date <= to {
                HALF_DAY
            } else {
                0.0
            }
        } else {
            overlap_days(request.start_date, request.end_date, from, to)
        };
        if days == 0.0 {
            continue;
        }

        let entry = by_category
            .entry(request.category_id)
            .or_insert_with(|| LeaveCategorySummary {
                category_id: request.category_id,
                approved_days: 0.0,
                pending_days: 0.0,
            });

        if approved {
            entry.approved_days += days;
        } else {
            entry.pending_days += days;
        }
    }

    by_category.into_values().collect()
}
