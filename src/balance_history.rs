use crate::chain::ChainReconstructor;
use crate::error::ChainBreak;
use crate::schema::Account;
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    /// Summed closing balance of all accounts at the end of `date`
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceHistory {
    pub points: Vec<BalancePoint>,
    pub warnings: Vec<String>,
    /// Accounts whose chain broke, keyed by account id. Only the linked
    /// prefix of those accounts contributes to `points`.
    pub breaks: BTreeMap<String, ChainBreak>,
}

impl BalanceHistory {
    pub fn is_complete(&self) -> bool {
        self.breaks.is_empty()
    }
}

/// Daily closing balances of every account, merged into one line.
///
/// Each account is ordered with the chain reconstructor; an account's last
/// closing balance is held until its next active day, and it contributes 0
/// before its first transaction.
pub fn balance_history(accounts: &[Account], reconstructor: &ChainReconstructor) -> BalanceHistory {
    let mut history = BalanceHistory::default();
    let mut closings: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(accounts.len());

    for account in accounts {
        let ordered = match reconstructor.reconstruct(&account.transactions) {
            Ok(outcome) => {
                for warning in outcome.warnings {
                    history
                        .warnings
                        .push(format!("Account '{}': {}", account.name, warning));
                }
                outcome.ordered
            }
            Err(chain_break) => {
                let warning = format!("Account '{}': {}", account.name, chain_break);
                warn!("{}", warning);
                history.warnings.push(warning);
                for inner in &chain_break.warnings {
                    history
                        .warnings
                        .push(format!("Account '{}': {}", account.name, inner));
                }
                let partial = chain_break.partial.clone();
                history.breaks.insert(account.id.clone(), chain_break);
                partial
            }
        };

        let mut daily = BTreeMap::new();
        for tx in &ordered {
            daily.insert(tx.booking_date, tx.balance_after);
        }
        closings.push(daily);
    }

    let dates: BTreeSet<NaiveDate> = closings
        .iter()
        .flat_map(|daily| daily.keys().copied())
        .collect();

    let mut carried = vec![0.0; closings.len()];
    for date in dates {
        for (account_idx, daily) in closings.iter().enumerate() {
            if let Some(&closing) = daily.get(&date) {
                carried[account_idx] = closing;
            }
        }
        history.points.push(BalancePoint {
            date,
            balance: carried.iter().sum(),
        });
    }

    debug!(
        "Balance history over {} accounts: {} points, {} chain break(s)",
        accounts.len(),
        history.points.len(),
        history.breaks.len()
    );

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Transaction;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn test_merges_accounts_with_carry_forward() {
        let checking = Account::new("c", "Checking").with_transactions(vec![
            // Same-day pair listed out of order
            Transaction::new(d(1, 2), -40.0, 60.0),
            Transaction::new(d(1, 2), 100.0, 100.0),
            Transaction::new(d(1, 10), 15.0, 75.0),
        ]);
        let savings = Account::new("s", "Savings")
            .with_transactions(vec![Transaction::new(d(1, 5), 500.0, 500.0)]);

        let history = balance_history(&[checking, savings], &ChainReconstructor::default());

        assert!(history.is_complete());
        assert_eq!(
            history.points,
            vec![
                BalancePoint { date: d(1, 2), balance: 60.0 },
                BalancePoint { date: d(1, 5), balance: 560.0 },
                BalancePoint { date: d(1, 10), balance: 575.0 },
            ]
        );
    }

    #[test]
    fn test_chain_break_keeps_partial_line() {
        let broken = Account::new("b", "Broken").with_transactions(vec![
            Transaction::new(d(2, 1), 50.0, 50.0),
            Transaction::new(d(2, 3), -10.0, 40.0),
            Transaction::new(d(2, 9), 5.0, 905.0),
        ]);

        let history = balance_history(&[broken], &ChainReconstructor::default());

        assert!(!history.is_complete());
        assert!(history.breaks.contains_key("b"));
        assert_eq!(history.points.len(), 2);
        assert_eq!(history.points.last().unwrap().balance, 40.0);
        assert!(history.warnings[0].contains("Broken"));
    }
}
