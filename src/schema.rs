use crate::error::{LedgerInsightsError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BALANCE_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MATERIALITY_THRESHOLD: f64 = 0.02;
pub const DEFAULT_OTHER_CATEGORY: &str = "other";
pub const DEFAULT_UNCATEGORIZED_LABEL: &str = "uncategorized";
pub const DEFAULT_UNDEFINED_SUBCATEGORY_LABEL: &str = "undefined";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Tag {
    #[schemars(description = "Top-level category, e.g. 'groceries' or 'salary'")]
    pub category: String,

    #[serde(default)]
    #[schemars(description = "Optional refinement within the category, e.g. 'supermarket'")]
    pub sub_category: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "If true the transaction is excluded from income, expense and balance statistics. It still takes part in balance chain reconstruction."
    )]
    pub ignore: bool,
}

impl Tag {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            sub_category: None,
            ignore: false,
        }
    }

    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Signed amount. Positive is an inflow, negative an outflow.")]
    pub amount: f64,

    #[schemars(description = "Account balance immediately after this transaction posted")]
    pub balance_after: f64,

    #[schemars(description = "Booking date in YYYY-MM-DD format. Used for chain reconstruction.")]
    pub booking_date: NaiveDate,

    #[schemars(description = "Value date in YYYY-MM-DD format. Used for period aggregation.")]
    pub value_date: NaiveDate,

    #[serde(default)]
    #[schemars(description = "Externally supplied category metadata")]
    pub tag: Option<Tag>,
}

impl Transaction {
    /// Transaction booked and valued on the same day, without a tag.
    pub fn new(date: NaiveDate, amount: f64, balance_after: f64) -> Self {
        Self {
            amount,
            balance_after,
            booking_date: date,
            value_date: date,
            tag: None,
        }
    }

    pub fn with_value_date(mut self, value_date: NaiveDate) -> Self {
        self.value_date = value_date;
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Balance the account held right before this transaction posted.
    pub fn balance_before(&self) -> f64 {
        self.balance_after - self.amount
    }

    pub fn is_ignored(&self) -> bool {
        self.tag.as_ref().is_some_and(|t| t.ignore)
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Account {
    #[schemars(description = "Stable identifier of the account")]
    pub id: String,

    #[schemars(description = "Display name, e.g. 'Checking' or 'Savings'")]
    pub name: String,

    #[serde(default)]
    #[schemars(
        description = "Transactions of this account, already parsed and deduplicated. Order is not required; when present, the first element is treated as the oldest and the last as the newest."
    )]
    pub transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transactions: Vec::new(),
        }
    }

    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Vec<Account>)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct InsightsConfig {
    #[schemars(
        description = "Maximum difference tolerated when matching one transaction's pre-balance to the previous transaction's post-balance. Covers minor-unit rounding."
    )]
    pub balance_tolerance: f64,

    #[schemars(
        description = "Minimum share (0.0 to 1.0) of a side's total a category needs to stay separate. Smaller categories are folded into the 'other' bucket."
    )]
    pub materiality_threshold: f64,

    #[schemars(description = "Name of the catch-all bucket receiving folded categories")]
    pub other_category: String,

    #[schemars(description = "Category assigned to transactions without a tag")]
    pub uncategorized_label: String,

    #[schemars(description = "Subcategory assigned when a tag has none")]
    pub undefined_subcategory_label: String,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: DEFAULT_BALANCE_TOLERANCE,
            materiality_threshold: DEFAULT_MATERIALITY_THRESHOLD,
            other_category: DEFAULT_OTHER_CATEGORY.to_string(),
            uncategorized_label: DEFAULT_UNCATEGORIZED_LABEL.to_string(),
            undefined_subcategory_label: DEFAULT_UNDEFINED_SUBCATEGORY_LABEL.to_string(),
        }
    }
}

impl InsightsConfig {
    pub fn with_materiality_threshold(mut self, threshold: f64) -> Self {
        self.materiality_threshold = threshold;
        self
    }

    pub fn with_balance_tolerance(mut self, tolerance: f64) -> Self {
        self.balance_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.materiality_threshold)?;
        validate_tolerance(self.balance_tolerance)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(InsightsConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(LedgerInsightsError::InvalidThreshold(threshold));
    }
    Ok(())
}

pub fn validate_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(LedgerInsightsError::InvalidTolerance(tolerance));
    }
    Ok(())
}
