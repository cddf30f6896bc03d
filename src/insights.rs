use crate::period::{Granularity, MonthKey, WeekKey};
use crate::schema::Transaction;
use crate::utils::safe_ratio;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Income/expense statistics for one bucket. `expense` is a positive magnitude.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub income: f64,
    pub expense: f64,
    /// `income - expense`
    pub balance: f64,
    pub transaction_count: usize,
    pub income_count: usize,
    pub expense_count: usize,
    /// Summed account balances at the start of the period
    pub balance_before: f64,
    /// Summed account balances at the end of the period
    pub balance_after: f64,
}

impl PeriodStats {
    /// Adds a transaction's amount to the income or expense side.
    pub fn record(&mut self, tx: &Transaction) {
        self.transaction_count += 1;
        if tx.is_income() {
            self.income += tx.amount;
            self.income_count += 1;
        } else if tx.is_expense() {
            self.expense += -tx.amount;
            self.expense_count += 1;
        }
        self.balance = self.income - self.expense;
    }

    /// Adds another bucket's flows; balances are left untouched.
    pub fn absorb_flows(&mut self, other: &PeriodStats) {
        self.income += other.income;
        self.expense += other.expense;
        self.transaction_count += other.transaction_count;
        self.income_count += other.income_count;
        self.expense_count += other.expense_count;
        self.balance = self.income - self.expense;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period<K> {
    pub key: K,
    #[serde(flatten)]
    pub stats: PeriodStats,
}

pub type DailySeries = Vec<Period<NaiveDate>>;
pub type WeeklySeries = Vec<Period<WeekKey>>;
pub type MonthlySeries = Vec<Period<MonthKey>>;
pub type YearlySeries = Vec<Period<i32>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl Averages {
    pub fn over(totals: &PeriodStats, periods: usize) -> Self {
        let n = periods as f64;
        Self {
            income: safe_ratio(totals.income, n),
            expense: safe_ratio(totals.expense, n),
            balance: safe_ratio(totals.balance, n),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    #[serde(flatten)]
    pub totals: PeriodStats,
    pub day_count: usize,
    pub week_count: usize,
    pub month_count: usize,
    pub year_count: usize,
    pub avg_per_day: Averages,
    pub avg_per_week: Averages,
    pub avg_per_month: Averages,
    pub avg_per_year: Averages,
}

impl OverallStats {
    /// Derives per-period averages from totals and distinct period counts.
    ///
    /// A zero period count yields zero averages and a warning.
    pub fn from_totals(
        totals: PeriodStats,
        counts: [usize; 4],
        warnings: &mut Vec<String>,
    ) -> Self {
        let [day_count, week_count, month_count, year_count] = counts;
        for (granularity, count) in Granularity::ALL.iter().zip(counts) {
            if count == 0 {
                let warning = format!(
                    "No {} periods observed; average per {} reported as 0",
                    granularity, granularity
                );
                debug!("{}", warning);
                warnings.push(warning);
            }
        }

        Self {
            avg_per_day: Averages::over(&totals, day_count),
            avg_per_week: Averages::over(&totals, week_count),
            avg_per_month: Averages::over(&totals, month_count),
            avg_per_year: Averages::over(&totals, year_count),
            totals,
            day_count,
            week_count,
            month_count,
            year_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub overall: OverallStats,
    pub daily: DailySeries,
    pub weekly: WeeklySeries,
    pub monthly: MonthlySeries,
    pub yearly: YearlySeries,
    pub warnings: Vec<String>,
}

impl Insights {
    pub fn first_day(&self) -> Option<NaiveDate> {
        self.daily.first().map(|p| p.key)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.daily.last().map(|p| p.key)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_splits_income_and_expense() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut stats = PeriodStats::default();
        stats.record(&Transaction::new(date, 100.0, 100.0));
        stats.record(&Transaction::new(date, -30.0, 70.0));
        stats.record(&Transaction::new(date, 0.0, 70.0));

        assert_eq!(stats.income, 100.0);
        assert_eq!(stats.expense, 30.0);
        assert_eq!(stats.balance, 70.0);
        assert_eq!(stats.transaction_count, 3);
        assert_eq!(stats.income_count, 1);
        assert_eq!(stats.expense_count, 1);
    }

    #[test]
    fn test_averages_guard_zero_periods() {
        let totals = PeriodStats {
            income: 120.0,
            expense: 60.0,
            balance: 60.0,
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let overall = OverallStats::from_totals(totals, [0, 0, 3, 1], &mut warnings);

        assert_eq!(overall.avg_per_day.income, 0.0);
        assert_eq!(overall.avg_per_week.expense, 0.0);
        assert!((overall.avg_per_month.income - 40.0).abs() < 1e-9);
        assert!((overall.avg_per_year.balance - 60.0).abs() < 1e-9);
        assert_eq!(warnings.len(), 2);
    }
}
