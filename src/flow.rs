//! Node/link lists for flow (Sankey) diagrams.
//!
//! Layout: income subcategory -> income category -> hub -> expense category
//! -> expense subcategory. A surplus flows from the hub into a savings node;
//! a shortfall flows from a deficit node into the hub.

use crate::categories::{CategoryInsights, CategorySide, Side};
use crate::error::{LedgerInsightsError, Result};
use crate::utils::approx_eq;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const HUB_NODE: &str = "budget";
pub const SAVINGS_NODE: &str = "savings";
pub const DEFICIT_NODE: &str = "deficit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSide {
    Income,
    Hub,
    Expense,
}

impl From<Side> for FlowSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Income => FlowSide::Income,
            Side::Expense => FlowSide::Expense,
        }
    }
}

impl fmt::Display for FlowSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowSide::Income => "income",
            FlowSide::Hub => "hub",
            FlowSide::Expense => "expense",
        };
        f.write_str(label)
    }
}

/// Identity of a node. Subcategory nodes carry their parent category, so
/// equal subcategory names under different categories stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub side: FlowSide,
    pub category: String,
    pub subcategory: Option<String>,
}

impl NodeKey {
    pub fn new(side: FlowSide, category: impl Into<String>) -> Self {
        Self {
            side,
            category: category.into(),
            subcategory: None,
        }
    }

    pub fn subcategory(
        side: FlowSide,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            side,
            category: category.into(),
            subcategory: Some(subcategory.into()),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subcategory {
            Some(sub) => write!(f, "'{}' > '{}'", self.category, sub),
            None => write!(f, "'{}'", self.category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: usize,
    pub label: String,
    pub key: NodeKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Bidirectional mapping between node keys and dense node ids.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    ids: HashMap<NodeKey, usize>,
    nodes: Vec<FlowNode>,
}

impl NodeIndex {
    /// Registers a node, returning the existing id if the key is known.
    pub fn insert(&mut self, key: NodeKey, label: impl Into<String>) -> usize {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(FlowNode {
            id,
            label: label.into(),
            key: key.clone(),
        });
        self.ids.insert(key, id);
        id
    }

    pub fn id_of(&self, key: &NodeKey) -> Result<usize> {
        self.ids
            .get(key)
            .copied()
            .ok_or_else(|| LedgerInsightsError::NodeNotFound {
                side: key.side.to_string(),
                key: key.to_string(),
            })
    }

    pub fn node(&self, id: usize) -> Option<&FlowNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn into_nodes(self) -> Vec<FlowNode> {
        self.nodes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDiagram {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

struct FlowBuilder {
    index: NodeIndex,
    links: Vec<FlowLink>,
}

impl FlowBuilder {
    fn link(&mut self, source: &NodeKey, target: &NodeKey, value: f64) -> Result<()> {
        if value <= 0.0 {
            return Ok(());
        }
        let source = self.index.id_of(source)?;
        let target = self.index.id_of(target)?;
        self.links.push(FlowLink {
            source,
            target,
            value,
        });
        Ok(())
    }

    fn register_side(&mut self, side: Side, categories: &CategorySide) {
        let flow_side = FlowSide::from(side);
        for (name, stats) in categories.by_amount() {
            self.index.insert(NodeKey::new(flow_side, name), name);
            for sub_name in stats.subcategories.keys() {
                self.index
                    .insert(NodeKey::subcategory(flow_side, name, sub_name), sub_name.as_str());
            }
        }
    }

    fn link_side(&mut self, side: Side, categories: &CategorySide, hub: &NodeKey) -> Result<()> {
        let flow_side = FlowSide::from(side);
        for (name, stats) in categories.by_amount() {
            let category = NodeKey::new(flow_side, name);
            match side {
                Side::Income => self.link(&category, hub, stats.amount)?,
                Side::Expense => self.link(hub, &category, stats.amount)?,
            }
            for (sub_name, sub) in &stats.subcategories {
                let subcategory = NodeKey::subcategory(flow_side, name, sub_name);
                match side {
                    Side::Income => self.link(&subcategory, &category, sub.amount)?,
                    Side::Expense => self.link(&category, &subcategory, sub.amount)?,
                }
            }
        }
        Ok(())
    }
}

/// Builds the node and link lists for a flow diagram of `insights`.
pub fn build_flow_diagram(insights: &CategoryInsights, tolerance: f64) -> Result<FlowDiagram> {
    let mut builder = FlowBuilder {
        index: NodeIndex::default(),
        links: Vec::new(),
    };

    let hub = NodeKey::new(FlowSide::Hub, HUB_NODE);
    let savings = NodeKey::new(FlowSide::Hub, SAVINGS_NODE);
    let deficit = NodeKey::new(FlowSide::Hub, DEFICIT_NODE);

    let surplus = insights.income.total - insights.expense.total;
    let balanced = approx_eq(surplus, 0.0, tolerance);

    builder.register_side(Side::Income, &insights.income);
    if !balanced && surplus < 0.0 {
        builder.index.insert(deficit.clone(), DEFICIT_NODE);
    }
    builder.index.insert(hub.clone(), HUB_NODE);
    builder.register_side(Side::Expense, &insights.expense);
    if !balanced && surplus > 0.0 {
        builder.index.insert(savings.clone(), SAVINGS_NODE);
    }

    builder.link_side(Side::Income, &insights.income, &hub)?;
    if !balanced {
        if surplus > 0.0 {
            builder.link(&hub, &savings, surplus)?;
        } else {
            builder.link(&deficit, &hub, -surplus)?;
        }
    }
    builder.link_side(Side::Expense, &insights.expense, &hub)?;

    Ok(FlowDiagram {
        nodes: builder.index.into_nodes(),
        links: builder.links,
    })
}
