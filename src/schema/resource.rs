use serde::{Deserialize, Serialize};

use super::value::{Expression, Value};

/// A resource as authored: a named numeric or boolean game variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDef {
    pub name: String,
    /// Initial preview value.
    #[serde(default)]
    pub value: Value,
    /// Initial committed value. Falls back to `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_value: Option<Value>,
    /// Upper bound, re-evaluated on every clamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Expression>,
    /// Lower bound, re-evaluated on every clamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Expression>,
    #[serde(default)]
    pub show: bool,
    /// Only show while the value is truthy.
    #[serde(default)]
    pub show_if_positive: bool,
    /// `true` when higher is better, `false` when lower is better.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<bool>,
    /// Include in the final recap.
    #[serde(default)]
    pub summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceDef {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            real_value: None,
            max_value: None,
            min_value: None,
            show: false,
            show_if_positive: false,
            positive: None,
            summary: false,
            description: None,
        }
    }

    pub fn with_max(mut self, max: impl Into<Expression>) -> Self {
        self.max_value = Some(max.into());
        self
    }

    pub fn with_min(mut self, min: impl Into<Expression>) -> Self {
        self.min_value = Some(min.into());
        self
    }

    pub fn initial_committed(&self) -> Value {
        self.real_value.clone().unwrap_or_else(|| self.value.clone())
    }
}
