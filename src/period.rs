use crate::utils::{week_end, week_start};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Year,
    ];
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        f.write_str(label)
    }
}

/// ISO week, ordered by its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct WeekKey {
    pub start: NaiveDate,
    pub iso_year: i32,
    pub iso_week: u32,
}

impl WeekKey {
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            start: week_start(date),
            iso_year: iso.year(),
            iso_week: iso.week(),
        }
    }

    pub fn end(&self) -> NaiveDate {
        week_end(self.start)
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && self.end() >= start
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.iso_year, self.iso_week)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Numeric bucket code, `year * 100 + month`.
    pub fn code(&self) -> i32 {
        self.year * 100 + self.month as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let month = code.rem_euclid(100);
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self {
            year: code.div_euclid(100),
            month: month as u32,
        })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Every bucket a single date falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodKeys {
    pub day: NaiveDate,
    pub week: WeekKey,
    pub month: MonthKey,
    pub year: i32,
}

pub fn period_keys(date: NaiveDate) -> PeriodKeys {
    PeriodKeys {
        day: date,
        week: WeekKey::from_date(date),
        month: MonthKey::from_date(date),
        year: date.year(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_keys() {
        let keys = period_keys(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(keys.day, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(keys.week.start, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(keys.week.iso_week, 11);
        assert_eq!(keys.month.code(), 202403);
        assert_eq!(keys.year, 2024);
    }

    #[test]
    fn test_iso_week_at_year_boundary() {
        // 2024-12-31 belongs to ISO week 1 of 2025
        let week = WeekKey::from_date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(week.start, NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(week.iso_year, 2025);
        assert_eq!(week.iso_week, 1);
        assert_eq!(week.to_string(), "2025-W01");

        // 2021-01-03 still belongs to 2020-W53
        let week = WeekKey::from_date(NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());
        assert_eq!(week.iso_year, 2020);
        assert_eq!(week.iso_week, 53);
    }

    #[test]
    fn test_month_key_ordering_and_code() {
        let dec = MonthKey::from_date(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        let jan = MonthKey::from_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(dec < jan);
        assert_eq!(MonthKey::from_code(202312), Some(dec));
        assert_eq!(MonthKey::from_code(202313), None);
        assert_eq!(jan.to_string(), "2024-01");
    }

    #[test]
    fn test_week_overlap() {
        let week = WeekKey::from_date(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        assert!(week.overlaps(d(7), d(20)));
        assert!(week.overlaps(d(2), d(2)));
        assert!(!week.overlaps(d(8), d(20)));
    }
}
