use crate::error::{LedgerInsightsError, Result};
use chrono::{Datelike, Duration, NaiveDate};

pub fn first_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        return NaiveDate::from_ymd_opt(date.year(), 12, 31);
    }
    NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)?.pred_opt()
}

/// `None` when `date` lies in the first representable month.
pub fn prev_month_end(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date)?.pred_opt()
}

pub fn first_day_of_year(date: NaiveDate) -> Option<NaiveDate> {
    date.with_ordinal(1)
}

pub fn last_day_of_year(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), 12, 31)
}

/// Monday of the ISO week containing `date`, clamped to `NaiveDate::MIN`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = Duration::days(i64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_signed(offset).unwrap_or(NaiveDate::MIN)
}

/// Sunday of the ISO week containing `date`, clamped to `NaiveDate::MAX`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date)
        .checked_add_signed(Duration::days(6))
        .unwrap_or(NaiveDate::MAX)
}

/// Division that resolves to 0.0 instead of NaN or infinity.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Parses a period string into inclusive (start, end) dates.
///
/// Accepted forms: "YYYY", "YYYY-MM", "YYYY-MM-DD", and any two of these joined
/// by ':' ("2023-01:2023-03", "2023-01-15:2023-02-10").
pub fn parse_period_string(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.len() {
        1 => {
            let (start, end) = parse_period_part(parts[0])?;
            Ok((start, end))
        }
        2 => {
            let (start, _) = parse_period_part(parts[0])?;
            let (_, end) = parse_period_part(parts[1])?;
            Ok((start, end))
        }
        _ => Err(LedgerInsightsError::DateError(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}

fn parse_period_part(part: &str) -> Result<(NaiveDate, NaiveDate)> {
    let part = part.trim();
    let invalid = || {
        LedgerInsightsError::DateError(format!(
            "Invalid date format in period: {}. Expected YYYY, YYYY-MM or YYYY-MM-DD",
            part
        ))
    };

    match part.len() {
        4 => {
            let start =
                NaiveDate::parse_from_str(&format!("{}-01-01", part), "%Y-%m-%d").map_err(|_| invalid())?;
            let end = last_day_of_year(start).ok_or_else(invalid)?;
            Ok((start, end))
        }
        7 => {
            let start =
                NaiveDate::parse_from_str(&format!("{}-01", part), "%Y-%m-%d").map_err(|_| invalid())?;
            let end = last_day_of_month(start).ok_or_else(invalid)?;
            Ok((start, end))
        }
        10 => {
            let date = NaiveDate::parse_from_str(part, "%Y-%m-%d").map_err(|_| invalid())?;
            Ok((date, date))
        }
        _ => Err(invalid()),
    }
}
