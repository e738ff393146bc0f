//! Selectable options as a domain model, independent of any view.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::warn;

use crate::schema::element::{ActionKind, OptionDef};
use crate::schema::event::GameEvent;
use crate::schema::story::Branch;
use crate::schema::value::Expression;

/// Why an option cannot be picked right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockReason {
    /// Customization is over; its options are frozen.
    Customization,
    /// Another member of its choice group was picked.
    Choice,
    /// Its condition evaluates false.
    Condition,
    /// Its category already has `maxSelect` active options.
    Limit,
    /// The story has reached its ending.
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectableOption {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_text: Option<String>,
    pub hidden: bool,
    /// Customization category this option belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Choice group this option belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub action: ActionKind,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<Vec<Branch>>,
    /// Toggle state. Always false for once options.
    pub active: bool,
    /// A once option that has been picked.
    pub picked: bool,
    pub visible: bool,
    pub lock_reasons: FxHashSet<LockReason>,
}

impl SelectableOption {
    pub fn from_def(id: String, def: &OptionDef, category: Option<&str>, group: Option<&str>) -> Self {
        Self {
            id,
            title: def.title.clone(),
            text: def.text.clone(),
            image: def.image.clone(),
            condition: def.condition.clone(),
            condition_text: def.condition_text.clone(),
            hidden: def.hidden,
            category: category.map(str::to_string),
            group: group.map(str::to_string),
            action: def.action,
            events: def.events.clone(),
            branch: def.branch.clone(),
            active: false,
            picked: false,
            visible: true,
            lock_reasons: FxHashSet::default(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.visible && self.lock_reasons.is_empty()
    }

    pub fn is_toggle(&self) -> bool {
        self.action == ActionKind::Toggle
    }

    /// Label used in the log and the recap.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Selection rules of one customization category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLimit {
    pub id: String,
    /// `None` is unlimited.
    pub max_select: Option<u32>,
    pub required: u32,
}

/// Every option created so far, in creation order.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: Vec<SelectableOption>,
    index: FxHashMap<String, usize>,
    next_id: u64,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh id of the form `{prefix}_{n}`. The counter is shared by all
    /// prefixes.
    pub fn generate_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    /// Register an authored option and return its id. Authored ids are kept
    /// unless already taken, in which case a fresh one is generated.
    pub fn register(&mut self, def: &OptionDef, category: Option<&str>, group: Option<&str>) -> String {
        let id = match def.id.as_deref() {
            Some(id) if !self.index.contains_key(id) => id.to_string(),
            Some(id) => {
                let fresh = self.generate_id("btn");
                warn!(option = id, replacement = %fresh, "option_id_taken");
                fresh
            }
            None => self.generate_id("btn"),
        };
        self.index.insert(id.clone(), self.options.len());
        self.options
            .push(SelectableOption::from_def(id.clone(), def, category, group));
        id
    }

    pub fn get(&self, id: &str) -> Option<&SelectableOption> {
        self.index.get(id).map(|&pos| &self.options[pos])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SelectableOption> {
        self.index.get(id).map(|&pos| &mut self.options[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectableOption> {
        self.options.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SelectableOption> {
        self.options.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn lock_all(&mut self, reason: LockReason) {
        for option in &mut self.options {
            option.lock_reasons.insert(reason);
        }
    }

    pub fn lock_group(&mut self, group: &str, reason: LockReason) {
        for option in &mut self.options {
            if option.group.as_deref() == Some(group) {
                option.lock_reasons.insert(reason);
            }
        }
    }

    pub fn active_in_category(&self, category: &str) -> usize {
        self.options
            .iter()
            .filter(|o| o.active && o.category.as_deref() == Some(category))
            .count()
    }

    /// Whether every category has at least its required active options.
    pub fn requirements_met(&self, limits: &[CategoryLimit]) -> bool {
        limits
            .iter()
            .all(|limit| self.active_in_category(&limit.id) >= limit.required as usize)
    }

    /// Lock inactive options of every category that is already full, and
    /// release the limit lock elsewhere.
    pub fn apply_category_limits(&mut self, limits: &[CategoryLimit]) {
        for limit in limits {
            let Some(max) = limit.max_select.filter(|&n| n > 0) else {
                continue;
            };
            let full = self.active_in_category(&limit.id) >= max as usize;
            for option in &mut self.options {
                if option.active || option.category.as_deref() != Some(limit.id.as_str()) {
                    continue;
                }
                if full {
                    option.lock_reasons.insert(LockReason::Limit);
                } else {
                    option.lock_reasons.remove(&LockReason::Limit);
                }
            }
        }
    }
}
