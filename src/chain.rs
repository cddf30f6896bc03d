//! Balance chain reconstruction ("domino sort").
//!
//! Bank exports only carry day-resolution booking dates, so several
//! transactions on the same day have no intrinsic order. Each transaction does
//! carry the balance right after it posted, which lets us link them like
//! dominoes: the next transaction is the one whose pre-balance equals the
//! current tail's post-balance.
//!
//! The start of the chain is picked with a heuristic: among the transactions
//! on the earliest booking date, the one with the lowest pre-balance starts
//! the chain. There is no proof this is right when several same-day branches
//! are possible. Treat the result as best-effort.

use crate::error::{ChainBreak, Result};
use crate::schema::{validate_tolerance, Transaction, DEFAULT_BALANCE_TOLERANCE};
use crate::utils::approx_eq;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainOutcome {
    pub ordered: Vec<Transaction>,
    pub warnings: Vec<String>,
}

pub struct ChainReconstructor {
    tolerance: f64,
}

impl Default for ChainReconstructor {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_BALANCE_TOLERANCE,
        }
    }
}

impl ChainReconstructor {
    pub fn new(tolerance: f64) -> Result<Self> {
        validate_tolerance(tolerance)?;
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn reconstruct(
        &self,
        transactions: &[Transaction],
    ) -> std::result::Result<ChainOutcome, ChainBreak> {
        if transactions.is_empty() {
            return Ok(ChainOutcome::default());
        }

        let mut remaining: Vec<Transaction> = transactions.to_vec();
        remaining.sort_by_key(|t| t.booking_date);

        let start_date = remaining[0].booking_date;
        let start_idx = remaining
            .iter()
            .enumerate()
            .take_while(|(_, t)| t.booking_date == start_date)
            .min_by(|(_, a), (_, b)| a.balance_before().total_cmp(&b.balance_before()))
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        let mut chain = vec![remaining.remove(start_idx)];
        let mut warnings = Vec::new();

        while let Some(next_idx) = self.find_successor(&chain, &mut remaining, &mut warnings) {
            chain.push(remaining.remove(next_idx));
        }

        let (same_day, other_days): (Vec<Transaction>, Vec<Transaction>) = remaining
            .into_iter()
            .partition(|t| t.booking_date == start_date);

        for tx in &same_day {
            let warning = format!(
                "Transaction on {} (amount {:.2}, balance after {:.2}) disregarded, doesn't fit chain",
                tx.booking_date, tx.amount, tx.balance_after
            );
            debug!("{}", warning);
            warnings.push(warning);
        }

        if let Some(first) = other_days.first() {
            let date = first.booking_date;
            debug!(
                "Chain broken at {}: {} transaction(s) left unlinked after {} linked",
                date,
                other_days.len(),
                chain.len()
            );
            return Err(ChainBreak {
                date,
                partial: chain,
                leftovers: other_days,
                warnings,
            });
        }

        Ok(ChainOutcome {
            ordered: chain,
            warnings,
        })
    }

    /// Index into `remaining` of the transaction that continues the chain.
    ///
    /// Candidates that match by balance but were booked before the tail are
    /// dropped from `remaining` with a warning.
    fn find_successor(
        &self,
        chain: &[Transaction],
        remaining: &mut Vec<Transaction>,
        warnings: &mut Vec<String>,
    ) -> Option<usize> {
        let tail = chain.last()?;

        let mut idx = 0;
        while idx < remaining.len() {
            let candidate = &remaining[idx];
            if !approx_eq(candidate.balance_before(), tail.balance_after, self.tolerance) {
                idx += 1;
                continue;
            }

            if candidate.booking_date < tail.booking_date {
                let warning = format!(
                    "Transaction on {} (amount {:.2}) matches balance {:.2} but precedes chain tail on {}; discarded",
                    candidate.booking_date, candidate.amount, tail.balance_after, tail.booking_date
                );
                debug!("{}", warning);
                warnings.push(warning);
                remaining.remove(idx);
                continue;
            }

            return Some(idx);
        }

        None
    }
}

/// Reconstructs a chain with the default 0.01 balance tolerance.
pub fn reconstruct_chain(
    transactions: &[Transaction],
) -> std::result::Result<ChainOutcome, ChainBreak> {
    ChainReconstructor::default().reconstruct(transactions)
}

/// Returns a description of every adjacent pair violating balance continuity.
pub fn continuity_violations(chain: &[Transaction], tolerance: f64) -> Vec<String> {
    chain
        .windows(2)
        .filter(|pair| !approx_eq(pair[1].balance_before(), pair[0].balance_after, tolerance))
        .map(|pair| {
            format!(
                "Balance after {:.2} on {} does not continue into {:.2} on {}",
                pair[0].balance_after,
                pair[0].booking_date,
                pair[1].balance_before(),
                pair[1].booking_date
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let outcome = reconstruct_chain(&[]).unwrap();
        assert!(outcome.ordered.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_orders_same_day_transactions_by_balance() {
        // Given in scrambled order; real order is +50, -20, +5
        let txs = vec![
            Transaction::new(d(1, 5), 5.0, 135.0),
            Transaction::new(d(1, 5), 50.0, 150.0),
            Transaction::new(d(1, 5), -20.0, 130.0),
        ];

        let outcome = reconstruct_chain(&txs).unwrap();
        let amounts: Vec<f64> = outcome.ordered.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![50.0, -20.0, 5.0]);
        assert!(outcome.warnings.is_empty());
        assert!(continuity_violations(&outcome.ordered, 0.01).is_empty());
    }

    #[test]
    fn test_spans_multiple_days() {
        let txs = vec![
            Transaction::new(d(1, 3), -10.0, 90.0),
            Transaction::new(d(1, 1), 100.0, 100.0),
            Transaction::new(d(1, 7), 40.0, 130.0),
        ];

        let outcome = reconstruct_chain(&txs).unwrap();
        let dates: Vec<NaiveDate> = outcome.ordered.iter().map(|t| t.booking_date).collect();
        assert_eq!(dates, vec![d(1, 1), d(1, 3), d(1, 7)]);
    }

    #[test]
    fn test_tolerates_rounding_slack() {
        let txs = vec![
            Transaction::new(d(1, 1), 10.0, 110.0),
            Transaction::new(d(1, 1), -5.0, 105.005),
        ];
        let outcome = reconstruct_chain(&txs).unwrap();
        assert_eq!(outcome.ordered.len(), 2);
    }

    #[test]
    fn test_heuristic_start_lowest_pre_balance_and_unfit_same_day_warning() {
        // Heuristic: the lowest pre-balance (100) starts the chain. After
        // 100 -> 110 -> 105 nothing continues, so +20 (pre 110) is dropped
        // with a warning instead of being silently misplaced.
        let txs = vec![
            Transaction::new(d(2, 1), -5.0, 105.0),
            Transaction::new(d(2, 1), 20.0, 130.0),
            Transaction::new(d(2, 1), 10.0, 110.0),
        ];

        let outcome = reconstruct_chain(&txs).unwrap();
        assert_eq!(outcome.ordered[0].amount, 10.0);
        assert_eq!(outcome.ordered.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("doesn't fit chain"));
        assert!(continuity_violations(&outcome.ordered, 0.01).is_empty());
    }

    #[test]
    fn test_leftover_from_other_date_is_chain_break() {
        let txs = vec![
            Transaction::new(d(3, 1), 100.0, 100.0),
            Transaction::new(d(3, 2), -30.0, 70.0),
            // Gap: the transaction bringing 70 -> 500 is missing
            Transaction::new(d(3, 9), 25.0, 525.0),
        ];

        let err = reconstruct_chain(&txs).unwrap_err();
        assert_eq!(err.date, d(3, 9));
        assert_eq!(err.partial.len(), 2);
        assert_eq!(err.leftovers.len(), 1);
        assert!(err.to_string().contains("2024-03-09"));
    }

    #[test]
    fn test_candidate_booked_before_tail_is_discarded() {
        let txs = vec![
            Transaction::new(d(4, 1), 100.0, 100.0),
            Transaction::new(d(4, 3), -40.0, 60.0),
            // Matches the 60 tail by balance but is dated before it
            Transaction::new(d(4, 2), 15.0, 75.0),
            Transaction::new(d(4, 5), 15.0, 75.0),
        ];

        let outcome = reconstruct_chain(&txs).unwrap();
        let dates: Vec<NaiveDate> = outcome.ordered.iter().map(|t| t.booking_date).collect();
        assert_eq!(dates, vec![d(4, 1), d(4, 3), d(4, 5)]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("precedes chain tail"));
    }

    #[test]
    fn test_rejects_invalid_tolerance() {
        assert!(ChainReconstructor::new(-1.0).is_err());
        assert!(ChainReconstructor::new(0.5).is_ok());
    }
}
