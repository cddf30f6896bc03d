//! Two-level category breakdown per side with materiality-based collapsing.

use crate::error::Result;
use crate::schema::{validate_threshold, Account, InsightsConfig, Transaction};
use crate::utils::safe_ratio;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Income,
    Expense,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Income => f.write_str("income"),
            Side::Expense => f.write_str("expense"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryStats {
    pub amount: f64,
    pub transaction_count: usize,
    /// Share of the side's total
    pub ratio_of_total: f64,
    /// Share of the parent category
    pub ratio_of_category: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub amount: f64,
    pub transaction_count: usize,
    pub ratio_of_total: f64,
    pub subcategories: BTreeMap<String, SubcategoryStats>,
}

impl CategoryStats {
    fn add(&mut self, subcategory: &str, amount: f64) {
        self.amount += amount;
        self.transaction_count += 1;
        let sub = self.subcategories.entry(subcategory.to_string()).or_default();
        sub.amount += amount;
        sub.transaction_count += 1;
    }

    fn refresh_ratios(&mut self, side_total: f64) {
        self.ratio_of_total = safe_ratio(self.amount, side_total);
        for sub in self.subcategories.values_mut() {
            sub.ratio_of_total = safe_ratio(sub.amount, side_total);
            sub.ratio_of_category = safe_ratio(sub.amount, self.amount);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySide {
    /// Sum of all category amounts, as a positive magnitude
    pub total: f64,
    pub transaction_count: usize,
    pub categories: BTreeMap<String, CategoryStats>,
}

impl CategorySide {
    /// Categories sorted by descending amount, name breaking ties.
    pub fn by_amount(&self) -> Vec<(&str, &CategoryStats)> {
        let mut sorted: Vec<(&str, &CategoryStats)> = self
            .categories
            .iter()
            .map(|(name, stats)| (name.as_str(), stats))
            .collect();
        sorted.sort_by(|a, b| b.1.amount.total_cmp(&a.1.amount).then_with(|| a.0.cmp(b.0)));
        sorted
    }

    fn refresh_ratios(&mut self) {
        let total = self.total;
        for stats in self.categories.values_mut() {
            stats.refresh_ratios(total);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsights {
    pub income: CategorySide,
    pub expense: CategorySide,
    pub warnings: Vec<String>,
}

impl CategoryInsights {
    pub fn side(&self, side: Side) -> &CategorySide {
        match side {
            Side::Income => &self.income,
            Side::Expense => &self.expense,
        }
    }
}

pub struct CategoryCollapser<'a> {
    config: &'a InsightsConfig,
}

impl<'a> CategoryCollapser<'a> {
    pub fn new(config: &'a InsightsConfig) -> Result<Self> {
        validate_threshold(config.materiality_threshold)?;
        Ok(Self { config })
    }

    /// Groups non-ignored transactions by side, category and subcategory,
    /// then folds immaterial categories into the catch-all bucket.
    pub fn build<'t>(
        &self,
        transactions: impl IntoIterator<Item = &'t Transaction>,
    ) -> CategoryInsights {
        let mut income = CategorySide::default();
        let mut expense = CategorySide::default();

        for tx in transactions {
            if tx.is_ignored() {
                continue;
            }
            let side = if tx.is_income() {
                &mut income
            } else if tx.is_expense() {
                &mut expense
            } else {
                continue;
            };

            let (category, subcategory) = self.labels(tx);
            let amount = tx.amount.abs();
            side.total += amount;
            side.transaction_count += 1;
            side.categories
                .entry(category.to_string())
                .or_default()
                .add(subcategory, amount);
        }

        income.refresh_ratios();
        expense.refresh_ratios();

        let mut warnings = Vec::new();
        let income = self.collapse_side(Side::Income, income, &mut warnings);
        let expense = self.collapse_side(Side::Expense, expense, &mut warnings);

        CategoryInsights {
            income,
            expense,
            warnings,
        }
    }

    /// Re-applies the collapse rule to already built insights.
    pub fn collapse(&self, insights: &CategoryInsights) -> CategoryInsights {
        let mut warnings = insights.warnings.clone();
        let income = self.collapse_side(Side::Income, insights.income.clone(), &mut warnings);
        let expense = self.collapse_side(Side::Expense, insights.expense.clone(), &mut warnings);
        CategoryInsights {
            income,
            expense,
            warnings,
        }
    }

    fn labels<'t>(&'t self, tx: &'t Transaction) -> (&'t str, &'t str) {
        let tag = tx.tag.as_ref();
        let category = tag
            .map(|t| t.category.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.uncategorized_label.as_str());
        let subcategory = tag
            .and_then(|t| t.sub_category.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.undefined_subcategory_label.as_str());
        (category, subcategory)
    }

    fn collapse_side(
        &self,
        side: Side,
        mut categories: CategorySide,
        warnings: &mut Vec<String>,
    ) -> CategorySide {
        let other_name = self.config.other_category.as_str();
        let threshold = self.config.materiality_threshold;

        let immaterial: Vec<String> = categories
            .categories
            .iter()
            .filter(|(name, stats)| name.as_str() != other_name && stats.ratio_of_total < threshold)
            .map(|(name, _)| name.clone())
            .collect();

        if immaterial.is_empty() {
            return categories;
        }

        let mut other = categories
            .categories
            .remove(other_name)
            .unwrap_or_default();

        for name in immaterial {
            let Some(folded) = categories.categories.remove(&name) else {
                continue;
            };

            let warning = format!(
                "{} category '{}' ({:.2}% of total) folded into '{}'",
                side,
                name,
                folded.ratio_of_total * 100.0,
                other_name
            );
            debug!("{}", warning);
            warnings.push(warning);

            other.amount += folded.amount;
            other.transaction_count += folded.transaction_count;
            for (sub_name, sub) in folded.subcategories {
                let merged = other
                    .subcategories
                    .entry(format!("{}-{}", name, sub_name))
                    .or_default();
                merged.amount += sub.amount;
                merged.transaction_count += sub.transaction_count;
            }
        }

        other.refresh_ratios(categories.total);
        categories.categories.insert(other_name.to_string(), other);
        categories
    }
}

pub fn category_insights(accounts: &[Account], config: &InsightsConfig) -> Result<CategoryInsights> {
    let collapser = CategoryCollapser::new(config)?;
    let insights = collapser.build(accounts.iter().flat_map(|a| a.transactions.iter()));
    debug!(
        "Built category insights: {} income and {} expense categories",
        insights.income.categories.len(),
        insights.expense.categories.len()
    );
    Ok(insights)
}
