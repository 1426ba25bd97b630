//! Month arithmetic for calendar browsing.
//!
//! Months are represented by their first day. Which month a log falls in
//! depends on the viewer's timezone, so filters take one explicitly.

use crate::model::habit::HabitLog;
use chrono::{Datelike, Months, NaiveDate, TimeZone};

/// Number of months offered by the month picker.
pub const MONTH_PICKER_SPAN: usize = 24;

/// First day of the month containing `day`.
pub fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// First day of the month `delta` months away from `day`.
///
/// Returns `None` when the result leaves chrono's supported range.
pub fn shift_month(day: NaiveDate, delta: i32) -> Option<NaiveDate> {
    let first = first_of_month(day);
    let step = Months::new(delta.unsigned_abs());
    if delta >= 0 {
        first.checked_add_months(step)
    } else {
        first.checked_sub_months(step)
    }
}

/// Month of `anchor` followed by the `count - 1` preceding months.
///
/// `anchor` is a local calendar day; callers resolve "today" in the
/// viewer's timezone before calling.
pub fn recent_months(anchor: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .map_while(|offset| i32::try_from(offset).ok())
        .map_while(|offset| shift_month(anchor, -offset))
        .collect()
}

/// Whether two days fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Display label such as `March 2025`.
pub fn month_label(day: NaiveDate) -> String {
    day.format("%B %Y").to_string()
}

/// Stable key such as `2025-03`.
pub fn month_key(day: NaiveDate) -> String {
    day.format("%Y-%m").to_string()
}

/// Logs whose day in `tz` lies in the month of `month`, newest first.
pub fn logs_in_month<'a, Tz: TimeZone>(
    logs: &'a [HabitLog],
    month: NaiveDate,
    tz: &Tz,
) -> Vec<&'a HabitLog> {
    let mut selected = logs
        .iter()
        .filter(|log| same_month(log.day_in(tz), month))
        .collect::<Vec<_>>();
    selected.sort_by(|a, b| b.date.cmp(&a.date));
    selected
}
