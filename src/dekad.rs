//! Dekad calendar arithmetic.
//!
//! A month has exactly three dekads: days 1-10, 11-20 and 21 to the end of
//! the month. The third dekad absorbs the 28/29/30/31 day variation.

use chrono::{Datelike, NaiveDate};

use crate::error::PrepError;
use crate::model::DekadRange;

fn month_days(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), PrepError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(PrepError::InvalidMonth(month))?;
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(PrepError::InvalidMonth(month))?;
    let last = next_month_first
        .pred_opt()
        .ok_or(PrepError::InvalidMonth(month))?;
    Ok((first, last))
}

fn range_for_days(
    year: i32,
    month: u32,
    start_day: u32,
    end_day: u32,
) -> Result<DekadRange, PrepError> {
    let start = NaiveDate::from_ymd_opt(year, month, start_day)
        .ok_or(PrepError::InvalidMonth(month))?;
    let end = NaiveDate::from_ymd_opt(year, month, end_day).ok_or(PrepError::InvalidMonth(month))?;
    Ok(DekadRange {
        reference: end.and_hms_opt(0, 0, 0).ok_or(PrepError::InvalidMonth(month))?,
        start: start.and_hms_opt(0, 0, 0).ok_or(PrepError::InvalidMonth(month))?,
        end: end.and_hms_opt(23, 59, 59).ok_or(PrepError::InvalidMonth(month))?,
    })
}

/// Resolves a `D1`/`D2`/`D3` label to its dekad range within a month.
///
/// The reference datetime is midnight of the dekad's last day, matching the
/// timestamp convention of dekadal products.
pub fn dekad(year: i32, month: u32, label: &str) -> Result<DekadRange, PrepError> {
    let (_, last) = month_days(year, month)?;
    let (start_day, end_day) = match label {
        "D1" => (1, 10),
        "D2" => (11, 20),
        "D3" => (21, last.day()),
        other => return Err(PrepError::InvalidDekadLabel(other.to_string())),
    };
    range_for_days(year, month, start_day, end_day)
}

/// Full-month range for monthly mapsets, same timestamp convention as
/// [`dekad`].
pub fn month_range(year: i32, month: u32) -> Result<DekadRange, PrepError> {
    let (_, last) = month_days(year, month)?;
    range_for_days(year, month, 1, last.day())
}
