//! # Ledger Insights
//!
//! Ledger reconstruction and temporal aggregation over bank account
//! transactions that were already parsed and tagged upstream.
//!
//! ## Core Concepts
//!
//! - **Chain reconstruction**: recovers the order of same-day transactions
//!   from their running balances ("domino sort"). Best-effort, see [`chain`].
//! - **Period buckets**: day, ISO week, month and year keys derived from a
//!   transaction's value date.
//! - **Carry-forward**: an account without activity in a period keeps its
//!   last known balance instead of dropping to zero.
//! - **Category collapsing**: categories below a materiality threshold are
//!   folded into an "other" bucket, keeping `category-subcategory` names for
//!   traceability.
//! - **Range filtering**: recomputes totals from the already bucketed daily
//!   series, never from raw transactions.
//!
//! Every entry point is a pure function of its inputs. Anomalies come back as
//! warning lists or error values; nothing is swallowed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_insights::*;
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let accounts = vec![Account::new("acc-1", "Checking").with_transactions(vec![
//!     Transaction::new(date, 2500.0, 2500.0).with_tag(Tag::new("salary")),
//!     Transaction::new(date, -900.0, 1600.0).with_tag(Tag::new("housing")),
//! ])];
//!
//! let processor = InsightsProcessor::new(InsightsConfig::default()).unwrap();
//! let insights = processor.aggregate(&accounts);
//! let january = processor.filter_by_range(&insights, &TimeRange::parse("2024-01").unwrap());
//! let categories = processor.category_insights(&accounts).unwrap();
//! ```

pub mod aggregator;
pub mod balance_history;
pub mod categories;
pub mod chain;
pub mod error;
pub mod flow;
pub mod insights;
pub mod period;
pub mod range;
pub mod schema;
pub mod utils;

pub use aggregator::Aggregator;
pub use balance_history::{BalanceHistory, BalancePoint};
pub use categories::{
    CategoryCollapser, CategoryInsights, CategorySide, CategoryStats, Side, SubcategoryStats,
};
pub use chain::{continuity_violations, ChainOutcome, ChainReconstructor};
pub use error::{ChainBreak, LedgerInsightsError, Result};
pub use flow::{build_flow_diagram, FlowDiagram, FlowLink, FlowNode, FlowSide, NodeIndex, NodeKey};
pub use insights::*;
pub use period::{period_keys, Granularity, MonthKey, PeriodKeys, WeekKey};
pub use range::{TimeRange, TimeRangePreset};
pub use schema::*;

use log::debug;

pub struct InsightsProcessor {
    config: InsightsConfig,
    reconstructor: ChainReconstructor,
}

impl InsightsProcessor {
    pub fn new(config: InsightsConfig) -> Result<Self> {
        config.validate()?;
        let reconstructor = ChainReconstructor::new(config.balance_tolerance)?;
        debug!(
            "Insights processor configured: tolerance {}, materiality threshold {}",
            config.balance_tolerance, config.materiality_threshold
        );
        Ok(Self {
            config,
            reconstructor,
        })
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn reconstruct_chain(
        &self,
        transactions: &[Transaction],
    ) -> std::result::Result<ChainOutcome, ChainBreak> {
        self.reconstructor.reconstruct(transactions)
    }

    pub fn aggregate(&self, accounts: &[Account]) -> Insights {
        debug!("Aggregating insights for {} accounts", accounts.len());
        Aggregator::new(accounts).aggregate()
    }

    pub fn filter_by_range(&self, insights: &Insights, range: &TimeRange) -> Insights {
        range::filter_by_range(insights, range)
    }

    pub fn category_insights(&self, accounts: &[Account]) -> Result<CategoryInsights> {
        categories::category_insights(accounts, &self.config)
    }

    pub fn flow_diagram(&self, accounts: &[Account]) -> Result<FlowDiagram> {
        let categories = self.category_insights(accounts)?;
        build_flow_diagram(&categories, self.config.balance_tolerance)
    }

    pub fn balance_history(&self, accounts: &[Account]) -> BalanceHistory {
        balance_history::balance_history(accounts, &self.reconstructor)
    }
}

impl Default for InsightsProcessor {
    fn default() -> Self {
        Self {
            config: InsightsConfig::default(),
            reconstructor: ChainReconstructor::default(),
        }
    }
}

pub fn reconstruct_chain(
    transactions: &[Transaction],
) -> std::result::Result<ChainOutcome, ChainBreak> {
    chain::reconstruct_chain(transactions)
}

pub fn aggregate(accounts: &[Account]) -> Insights {
    aggregator::aggregate(accounts)
}

pub fn filter_by_range(insights: &Insights, range: &TimeRange) -> Insights {
    range::filter_by_range(insights, range)
}

/// Category breakdown with an optional materiality threshold override.
pub fn category_insights(accounts: &[Account], threshold: Option<f64>) -> Result<CategoryInsights> {
    let mut config = InsightsConfig::default();
    if let Some(threshold) = threshold {
        config.materiality_threshold = threshold;
    }
    categories::category_insights(accounts, &config)
}
