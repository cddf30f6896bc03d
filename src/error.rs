use crate::schema::Transaction;
use chrono::NaiveDate;
use thiserror::Error;

/// A chain reconstruction that stopped before every transaction was linked.
///
/// The linked prefix is still usable, so callers can render a truncated but
/// consistent balance line instead of aborting.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Balance chain broken: {} transaction(s) from {date} could not be linked after {} linked transaction(s)", .leftovers.len(), .partial.len())]
pub struct ChainBreak {
    /// First booking date among the unlinked leftovers that forced the break
    pub date: NaiveDate,
    /// Chronological prefix that satisfies balance continuity
    pub partial: Vec<Transaction>,
    /// Transactions that could not be placed, in booking-date order
    pub leftovers: Vec<Transaction>,
    /// Non-fatal diagnostics gathered before the break
    pub warnings: Vec<String>,
}

#[derive(Error, Debug)]
pub enum LedgerInsightsError {
    #[error("Invalid materiality threshold {0}: must be between 0.0 and 1.0")]
    InvalidThreshold(f64),

    #[error("Invalid balance tolerance {0}: must be a finite, non-negative number")]
    InvalidTolerance(f64),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Flow diagram node not found: {side} '{key}'")]
    NodeNotFound { side: String, key: String },

    #[error(transparent)]
    ChainBreak(#[from] ChainBreak),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerInsightsError>;
