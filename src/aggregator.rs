use crate::insights::{Insights, OverallStats, Period, PeriodStats};
use crate::period::{period_keys, MonthKey, WeekKey};
use crate::schema::{Account, Transaction};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

/// Opening and closing balance of one account within one period.
#[derive(Debug, Clone, Copy)]
struct PeriodBounds {
    first_date: NaiveDate,
    opening: f64,
    last_date: NaiveDate,
    closing: f64,
}

impl PeriodBounds {
    fn new(tx: &Transaction) -> Self {
        Self {
            first_date: tx.value_date,
            opening: tx.balance_before(),
            last_date: tx.value_date,
            closing: tx.balance_after,
        }
    }

    // Ties on value_date: the earliest scanned opens, the latest scanned closes.
    fn observe(&mut self, tx: &Transaction) {
        if tx.value_date < self.first_date {
            self.first_date = tx.value_date;
            self.opening = tx.balance_before();
        }
        if tx.value_date >= self.last_date {
            self.last_date = tx.value_date;
            self.closing = tx.balance_after;
        }
    }
}

/// Statistics and per-account activity for one granularity.
struct GranularAccumulator<K> {
    stats: BTreeMap<K, PeriodStats>,
    activity: Vec<BTreeMap<K, PeriodBounds>>,
}

impl<K: Ord + Copy> GranularAccumulator<K> {
    fn new(account_count: usize) -> Self {
        Self {
            stats: BTreeMap::new(),
            activity: vec![BTreeMap::new(); account_count],
        }
    }

    fn observe(&mut self, account_idx: usize, key: K, tx: &Transaction) {
        let stats = self.stats.entry(key).or_default();
        if !tx.is_ignored() {
            stats.record(tx);
        }

        self.activity[account_idx]
            .entry(key)
            .and_modify(|bounds| bounds.observe(tx))
            .or_insert_with(|| PeriodBounds::new(tx));
    }

    /// Attaches balances in chronological key order, carrying each account's
    /// last known balance through periods where it had no activity.
    fn finalize(self) -> Vec<Period<K>> {
        let Self { stats, activity } = self;

        debug_assert!(
            activity
                .iter()
                .all(|periods| periods.keys().all(|k| stats.contains_key(k))),
            "account activity recorded for a period key missing from the statistics map"
        );

        let mut carried = vec![0.0; activity.len()];

        stats
            .into_iter()
            .map(|(key, mut stats)| {
                let mut balance_before = 0.0;
                let mut balance_after = 0.0;

                for (account_idx, periods) in activity.iter().enumerate() {
                    match periods.get(&key) {
                        Some(bounds) => {
                            balance_before += bounds.opening;
                            balance_after += bounds.closing;
                            carried[account_idx] = bounds.closing;
                        }
                        None => {
                            balance_before += carried[account_idx];
                            balance_after += carried[account_idx];
                        }
                    }
                }

                stats.balance_before = balance_before;
                stats.balance_after = balance_after;
                Period { key, stats }
            })
            .collect()
    }
}

pub struct Aggregator<'a> {
    accounts: &'a [Account],
}

impl<'a> Aggregator<'a> {
    pub fn new(accounts: &'a [Account]) -> Self {
        Self { accounts }
    }

    pub fn aggregate(&self) -> Insights {
        let account_count = self.accounts.len();
        let mut daily = GranularAccumulator::<NaiveDate>::new(account_count);
        let mut weekly = GranularAccumulator::<WeekKey>::new(account_count);
        let mut monthly = GranularAccumulator::<MonthKey>::new(account_count);
        let mut yearly = GranularAccumulator::<i32>::new(account_count);

        let mut warnings = Vec::new();
        let mut opening_total = 0.0;
        let mut closing_total = 0.0;
        let mut transaction_total = 0;

        for (account_idx, account) in self.accounts.iter().enumerate() {
            let (Some(first), Some(last)) =
                (account.transactions.first(), account.transactions.last())
            else {
                let warning = format!(
                    "Account '{}' has no transactions; it contributes a zero balance",
                    account.name
                );
                debug!("{}", warning);
                warnings.push(warning);
                continue;
            };

            opening_total += first.balance_before();
            closing_total += last.balance_after;
            transaction_total += account.transactions.len();

            for tx in &account.transactions {
                let keys = period_keys(tx.value_date);
                daily.observe(account_idx, keys.day, tx);
                weekly.observe(account_idx, keys.week, tx);
                monthly.observe(account_idx, keys.month, tx);
                yearly.observe(account_idx, keys.year, tx);
            }
        }

        let daily = daily.finalize();
        let weekly = weekly.finalize();
        let monthly = monthly.finalize();
        let yearly = yearly.finalize();

        let mut totals = PeriodStats::default();
        for period in &daily {
            totals.absorb_flows(&period.stats);
        }
        totals.balance_before = opening_total;
        totals.balance_after = closing_total;

        let overall = OverallStats::from_totals(
            totals,
            [daily.len(), weekly.len(), monthly.len(), yearly.len()],
            &mut warnings,
        );

        info!(
            "Aggregated {} transactions across {} accounts into {} days, {} weeks, {} months, {} years",
            transaction_total,
            account_count,
            daily.len(),
            weekly.len(),
            monthly.len(),
            yearly.len()
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
}

pub fn aggregate(accounts: &[Account]) -> Insights {
    Aggregator::new(accounts).aggregate()
}
