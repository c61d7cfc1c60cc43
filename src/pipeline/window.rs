//! Turn a configured `DateRange` into concrete request windows.
//!
//! Everything is computed in UTC from an injected `now`, so the same inputs
//! always produce the same windows regardless of the host time zone.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

use crate::domain::{DateRange, DateWindow};
use crate::error::AppError;

/// Plan the ordered list of windows to extract.
///
/// - `Fixed`: one window covering both end dates in full.
/// - `Interval`: one window of `days` ending at `now` (or today's midnight).
/// - `Backfill`: `days` one-day windows, most recent first.
pub fn plan_windows(range: &DateRange, now: DateTime<Utc>) -> Result<Vec<DateWindow>, AppError> {
    match *range {
        DateRange::Fixed { from, to } => {
            if to < from {
                return Err(AppError::config(format!(
                    "Fixed range ends ({to}) before it starts ({from})."
                )));
            }
            let end = to
                .succ_opt()
                .ok_or_else(|| AppError::config(format!("End date {to} is out of range.")))?;
            Ok(vec![DateWindow::new(midnight(from), midnight(end))])
        }
        DateRange::Interval { days, include_today } => {
            let to = anchor(now, include_today);
            let from = start_of_day(days_before(to, i64::from(days))?);
            Ok(vec![DateWindow::new(from, to)])
        }
        DateRange::Backfill { days, include_today } => {
            let anchor = anchor(now, include_today);
            // The oldest bound is the only one that can overflow.
            days_before(anchor, i64::from(days) + 1)?;
            (0..i64::from(days))
                .map(|d| -> Result<DateWindow, AppError> {
                    let to = days_before(anchor, d)?;
                    Ok(DateWindow::new(days_before(to, 1)?, to))
                })
                .collect()
        }
    }
}

fn days_before(ts: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, AppError> {
    Duration::try_days(days)
        .and_then(|delta| ts.checked_sub_signed(delta))
        .ok_or_else(|| AppError::config(format!("Going back {days} day(s) from {ts} is out of range.")))
}

/// Upper bound for rolling modes: `now` to the second, or today's midnight.
fn anchor(now: DateTime<Utc>, include_today: bool) -> DateTime<Utc> {
    if include_today {
        now.with_nanosecond(0).unwrap_or(now)
    } else {
        start_of_day(now)
    }
}

fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    midnight(ts.date_naive())
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))
}
