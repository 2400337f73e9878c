use chrono::NaiveDate;

/// Days consumed by a half-day request, whatever range was picked.
pub const HALF_DAY: f64 = 0.5;

/// Number of leave days a request between `from` and `to` consumes.
///
/// Counting is calendar-inclusive, so a single-day request is `1.0`.
/// A missing date or an inverted range yields `0.0`; the validator reports
/// the inverted range separately. A half-day request always counts as
/// [`HALF_DAY`] once both dates are picked.
pub fn compute_days(from: Option<NaiveDate>, to: Option<NaiveDate>, is_half_day: bool) -> f64 {
    let (Some(from), Some(to)) = (from, to) else {
        return 0.0;
    };

    if is_half_day {
        return HALF_DAY;
    }

    if to < from {
        return 0.0;
    }

    ((to - from).num_days() + 1) as f64
}

/// Days of `[from, to]` that fall inside `[window_start, window_end]`.
pub fn overlap_days(
    from: NaiveDate,
    to: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> f64 {
    let start = from.max(window_start);
    let end = to.min(window_end);
    compute_days(Some(start), Some(end), false)
}
