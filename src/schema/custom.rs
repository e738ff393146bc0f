use serde::{Deserialize, Serialize};

use super::element::Element;

/// A customization category: a titled group of options with selection
/// limits, shown before the story starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Most options that may be active at once. Absent or 0 is unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_select: Option<u32>,
    /// Fewest options that must be active before the story can start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<u32>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Category {
    /// Human-readable selection rules, e.g. "Choose up to 2 / Choose at least 1".
    pub fn rules_text(&self) -> Option<String> {
        let mut rules = Vec::new();
        if let Some(max) = self.max_select.filter(|&n| n > 0) {
            rules.push(format!("Choose up to {}", max));
        }
        if let Some(required) = self.required.filter(|&n| n > 0) {
            rules.push(format!("Choose at least {}", required));
        }
        if rules.is_empty() {
            None
        } else {
            Some(rules.join(" / "))
        }
    }
}
