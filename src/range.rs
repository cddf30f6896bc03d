use crate::error::{LedgerInsightsError, Result};
use crate::insights::{Insights, OverallStats, Period, PeriodStats};
use crate::period::MonthKey;
use crate::utils::{
    first_day_of_month, first_day_of_year, last_day_of_month, last_day_of_year,
    parse_period_string, prev_month_end,
};
use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LedgerInsightsError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses "YYYY", "YYYY-MM", "YYYY-MM-DD" or two of them joined by ':'.
    pub fn parse(period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        Self::new(start, end)
    }

    /// Range spanning every daily bucket of `insights`, if there are any.
    pub fn covering(insights: &Insights) -> Option<Self> {
        Some(Self {
            start: insights.first_day()?,
            end: insights.last_day()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangePreset {
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    All,
}

impl TimeRangePreset {
    /// Resolves the preset relative to `today`. `All` needs the data bounds
    /// from `insights` and yields `None` when there is no data. Presets that
    /// would fall outside the representable calendar also yield `None`.
    pub fn resolve(&self, today: NaiveDate, insights: &Insights) -> Option<TimeRange> {
        let (start, end) = match self {
            TimeRangePreset::Last7Days => (today.checked_sub_signed(Duration::days(6))?, today),
            TimeRangePreset::Last30Days => (today.checked_sub_signed(Duration::days(29))?, today),
            TimeRangePreset::ThisMonth => (first_day_of_month(today)?, last_day_of_month(today)?),
            TimeRangePreset::LastMonth => {
                let end = prev_month_end(today)?;
                (first_day_of_month(end)?, end)
            }
            TimeRangePreset::ThisYear => (first_day_of_year(today)?, last_day_of_year(today)?),
            TimeRangePreset::LastYear => {
                let end = first_day_of_year(today)?.pred_opt()?;
                (first_day_of_year(end)?, end)
            }
            TimeRangePreset::All => return TimeRange::covering(insights),
        };
        Some(TimeRange { start, end })
    }
}

fn keep<K>(series: &[Period<K>], predicate: impl Fn(&K) -> bool) -> Vec<Period<K>>
where
    K: Clone,
{
    series
        .iter()
        .filter(|p| predicate(&p.key))
        .cloned()
        .collect()
}

/// Restricts every series to `range` and recomputes the overall statistics
/// from the surviving daily buckets alone.
pub fn filter_by_range(insights: &Insights, range: &TimeRange) -> Insights {
    let first_month = MonthKey::from_date(range.start);
    let last_month = MonthKey::from_date(range.end);

    let daily = keep(&insights.daily, |day| range.contains(*day));
    let weekly = keep(&insights.weekly, |week| week.overlaps(range.start, range.end));
    let monthly = keep(&insights.monthly, |month| {
        first_month <= *month && *month <= last_month
    });
    let yearly = keep(&insights.yearly, |year| {
        range.start.year() <= *year && *year <= range.end.year()
    });

    let mut totals = PeriodStats::default();
    for period in &daily {
        totals.absorb_flows(&period.stats);
    }
    let mut warnings = Vec::new();
    if let (Some(first), Some(last)) = (daily.first(), daily.last()) {
        totals.balance_before = first.stats.balance_before;
        totals.balance_after = last.stats.balance_after;
    } else {
        // Idle range: hold the closing balance of the last active day before it
        let carried = insights
            .daily
            .iter()
            .take_while(|p| p.key < range.start)
            .last()
            .map_or(0.0, |p| p.stats.balance_after);
        totals.balance_before = carried;
        totals.balance_after = carried;

        let warning = format!(
            "No activity between {} and {}; flows reported as 0, balance held at {:.2}",
            range.start, range.end, carried
        );
        debug!("{}", warning);
        warnings.push(warning);
    }

    let overall = OverallStats::from_totals(
        totals,
        [daily.len(), weekly.len(), monthly.len(), yearly.len()],
        &mut warnings,
    );

    debug!(
        "Filtered insights to {}..={}: {} of {} days kept",
        range.start,
        range.end,
        daily.len(),
        insights.daily.len()
    );

    Insights {
        overall,
        daily,
        weekly,
        monthly,
        yearly,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::schema::{Account, Transaction};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> Insights {
        let account = Account::new("a", "Checking").with_transactions(vec![
            Transaction::new(d(2024, 1, 5), 1000.0, 1000.0),
            Transaction::new(d(2024, 1, 20), -200.0, 800.0),
            Transaction::new(d(2024, 2, 3), -50.0, 750.0),
            Transaction::new(d(2024, 2, 28), 300.0, 1050.0),
            Transaction::new(d(2024, 3, 10), -25.0, 1025.0),
        ]);
        aggregate(&[account])
    }

    #[test]
    fn test_time_range_validation() {
        assert!(TimeRange::new(d(2024, 2, 1), d(2024, 1, 1)).is_err());
        let range = TimeRange::parse("2024-01:2024-02").unwrap();
        assert_eq!(range.start, d(2024, 1, 1));
        assert_eq!(range.end, d(2024, 2, 29));
        assert!(TimeRange::parse("2024-03:2024-01").is_err());
    }

    #[test]
    fn test_filter_recomputes_from_daily_series() {
        let insights = sample();
        let range = TimeRange::new(d(2024, 1, 15), d(2024, 2, 10)).unwrap();
        let filtered = filter_by_range(&insights, &range);

        assert_eq!(filtered.daily.len(), 2);
        assert_eq!(filtered.overall.totals.income, 0.0);
        assert_eq!(filtered.overall.totals.expense, 250.0);
        assert_eq!(filtered.overall.totals.transaction_count, 2);
        assert_eq!(filtered.overall.totals.balance_before, 1000.0);
        assert_eq!(filtered.overall.totals.balance_after, 750.0);

        // Months touched by the range survive whole
        assert_eq!(filtered.monthly.len(), 2);
        assert_eq!(filtered.yearly.len(), 1);
        assert_eq!(filtered.overall.month_count, 2);
        assert!((filtered.overall.avg_per_month.expense - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_filtered_daily_sums_match_overall() {
        let insights = sample();
        let range = TimeRange::new(d(2024, 1, 1), d(2024, 2, 29)).unwrap();
        let filtered = filter_by_range(&insights, &range);

        let income: f64 = filtered.daily.iter().map(|p| p.stats.income).sum();
        let expense: f64 = filtered.daily.iter().map(|p| p.stats.expense).sum();
        assert!((income - filtered.overall.totals.income).abs() < 1e-9);
        assert!((expense - filtered.overall.totals.expense).abs() < 1e-9);
    }

    #[test]
    fn test_week_overlap_membership() {
        let insights = sample();
        // 2024-02-28 is a Wednesday; its week runs Feb 26 to Mar 3
        let range = TimeRange::new(d(2024, 3, 1), d(2024, 3, 2)).unwrap();
        let filtered = filter_by_range(&insights, &range);

        assert!(filtered.daily.is_empty());
        assert_eq!(filtered.weekly.len(), 1);
        assert_eq!(filtered.weekly[0].key.start, d(2024, 2, 26));
        assert_eq!(filtered.overall.totals.income, 0.0);
        assert!(!filtered.warnings.is_empty());
    }

    #[test]
    fn test_idle_range_holds_carried_balance() {
        let insights = sample();
        let range = TimeRange::new(d(2024, 3, 1), d(2024, 3, 2)).unwrap();
        let filtered = filter_by_range(&insights, &range);

        // Last active day before the range is 2024-02-28, closing at 1050
        assert_eq!(filtered.overall.totals.balance_before, 1050.0);
        assert_eq!(filtered.overall.totals.balance_after, 1050.0);
        assert_eq!(filtered.monthly[0].stats.balance_before, 1050.0);
        assert_eq!(filtered.overall.totals.expense, 0.0);

        // Nothing precedes a range before the first transaction
        let early = TimeRange::new(d(2023, 6, 1), d(2023, 6, 30)).unwrap();
        let filtered = filter_by_range(&insights, &early);
        assert_eq!(filtered.overall.totals.balance_after, 0.0);
    }

    #[test]
    fn test_presets() {
        let insights = sample();
        let today = d(2024, 3, 15);

        let last_month = TimeRangePreset::LastMonth.resolve(today, &insights).unwrap();
        assert_eq!(last_month, TimeRange { start: d(2024, 2, 1), end: d(2024, 2, 29) });

        let last_year = TimeRangePreset::LastYear.resolve(today, &insights).unwrap();
        assert_eq!(last_year, TimeRange { start: d(2023, 1, 1), end: d(2023, 12, 31) });

        let week = TimeRangePreset::Last7Days.resolve(today, &insights).unwrap();
        assert_eq!(week.start, d(2024, 3, 9));

        let all = TimeRangePreset::All.resolve(today, &insights).unwrap();
        assert_eq!(all, TimeRange { start: d(2024, 1, 5), end: d(2024, 3, 10) });

        assert!(TimeRangePreset::All
            .resolve(today, &Insights::default())
            .is_none());
    }

    #[test]
    fn test_presets_at_calendar_limits() {
        let insights = Insights::default();
        assert!(TimeRangePreset::Last7Days.resolve(NaiveDate::MIN, &insights).is_none());
        assert!(TimeRangePreset::LastMonth.resolve(NaiveDate::MIN, &insights).is_none());
        assert!(TimeRangePreset::LastYear.resolve(NaiveDate::MIN, &insights).is_none());

        let this_year = TimeRangePreset::ThisYear.resolve(NaiveDate::MAX, &insights).unwrap();
        assert_eq!(this_year.end, NaiveDate::MAX);
        let this_month = TimeRangePreset::ThisMonth.resolve(NaiveDate::MAX, &insights).unwrap();
        assert_eq!(this_month.end, NaiveDate::MAX);
    }
}
