use serde::{Deserialize, Serialize};

use super::element::Element;
use super::ordered::OrderedMap;
use super::value::Expression;

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// A story node ("event"): a unit of narrative with one or more pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Non-repeatable nodes are entered at most once per session.
    #[serde(default = "default_true")]
    pub repeatable: bool,
    /// Page entered first. Defaults to `"start"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default)]
    pub pages: OrderedMap<Page>,
}

impl StoryNode {
    pub const DEFAULT_START: &'static str = "start";

    pub fn start_page_id(&self) -> &str {
        self.start.as_deref().unwrap_or(Self::DEFAULT_START)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    /// One-line recap of what happens on this page.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// Where a branch leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchTarget {
    /// Leave the node and pick the next one.
    Next,
    /// Another page of the current node.
    Page(String),
    /// An ending, by id.
    Ending(String),
}

/// A weighted, prioritized, conditional exit from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBranch", into = "RawBranch")]
pub struct Branch {
    pub condition: Option<Expression>,
    pub priority: i64,
    pub weight: f64,
    pub target: BranchTarget,
}

impl Branch {
    pub fn new(target: BranchTarget) -> Self {
        Self {
            condition: None,
            priority: 0,
            weight: 1.0,
            target,
        }
    }
}

// Content writes the target as a `type` tag plus a sibling `value`, with a
// missing or unrecognised tag meaning "next". That does not map onto a
// serde enum representation, so branches go through this shape.

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBranch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Expression>,
    #[serde(default)]
    priority: i64,
    #[serde(default = "default_weight")]
    weight: f64,
}

impl From<RawBranch> for Branch {
    fn from(raw: RawBranch) -> Self {
        let value = raw.value.unwrap_or_default();
        let target = match raw.kind.as_deref() {
            Some("page") => BranchTarget::Page(value),
            Some("ending") => BranchTarget::Ending(value),
            _ => BranchTarget::Next,
        };
        Self {
            condition: raw.condition.filter(|c| !c.is_empty()),
            priority: raw.priority,
            weight: raw.weight,
            target,
        }
    }
}

impl From<Branch> for RawBranch {
    fn from(branch: Branch) -> Self {
        let (kind, value) = match branch.target {
            BranchTarget::Next => ("next", None),
            BranchTarget::Page(id) => ("page", Some(id)),
            BranchTarget::Ending(id) => ("ending", Some(id)),
        };
        Self {
            kind: Some(kind.to_string()),
            value,
            condition: branch.condition,
            priority: branch.priority,
            weight: branch.weight,
        }
    }
}

/// A terminal story node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub elements: Vec<Element>,
}
