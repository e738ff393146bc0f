use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::Expression;

/// A declarative event attached to options, settings and content.
///
/// Events are the only way content asks the engine to do something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Leave the intro and open character customization.
    #[serde(rename = "cyoaStart")]
    StartCustomization,
    /// Commit the customization and enter the story loop.
    #[serde(rename = "eventStart")]
    StartEventLoop,
    /// Mutate a resource, the tag set or the item multiset.
    #[serde(rename = "setValue")]
    SetValue(Mutation),
    /// Leave the ending and show the recap.
    #[serde(rename = "viewSummary")]
    ViewSummary,
    #[serde(other)]
    Unknown,
}

impl GameEvent {
    pub fn mutation(&self) -> Option<&Mutation> {
        match self {
            Self::SetValue(m) => Some(m),
            _ => None,
        }
    }
}

/// What a `setValue` event changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MutationTarget {
    Tags,
    Items,
    Resource(String),
}

impl From<String> for MutationTarget {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tags" => Self::Tags,
            "items" => Self::Items,
            _ => Self::Resource(s),
        }
    }
}

impl From<MutationTarget> for String {
    fn from(target: MutationTarget) -> Self {
        match target {
            MutationTarget::Tags => "tags".to_string(),
            MutationTarget::Items => "items".to_string(),
            MutationTarget::Resource(id) => id,
        }
    }
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tags => f.write_str("tags"),
            Self::Items => f.write_str("items"),
            Self::Resource(id) => f.write_str(id),
        }
    }
}

/// Mutation operator. Resources take the arithmetic forms, tags and items
/// take `add`/`remove`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    /// `=`
    Assign,
    /// `+`
    Increase,
    /// `-`
    Decrease,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `add`
    Add,
    /// `remove`
    Remove,
    Unknown(String),
}

impl Operation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Assign => "=",
            Self::Increase => "+",
            Self::Decrease => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Unknown(s) => s,
        }
    }

    /// Whether this operator is meaningful for the given target.
    pub fn applies_to(&self, target: &MutationTarget) -> bool {
        match target {
            MutationTarget::Tags | MutationTarget::Items => {
                matches!(self, Self::Add | Self::Remove)
            }
            MutationTarget::Resource(_) => matches!(
                self,
                Self::Assign | Self::Increase | Self::Decrease | Self::Multiply | Self::Divide
            ),
        }
    }
}

impl From<String> for Operation {
    fn from(s: String) -> Self {
        match s.as_str() {
            "=" => Self::Assign,
            "+" => Self::Increase,
            "-" => Self::Decrease,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "add" => Self::Add,
            "remove" => Self::Remove,
            _ => Self::Unknown(s),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.as_str().to_string()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Payload of a `setValue` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    pub target: MutationTarget,
    pub operation: Operation,
    /// Expression evaluated against the preview state when applied.
    #[serde(default)]
    pub value: Expression,
    /// Item copies to add or remove. `0` on remove removes every copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Guard; when it evaluates false the mutation is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    /// Author-facing explanation of the guard, shown next to the effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_text: Option<String>,
    /// Hide this effect from option previews and the recap.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Mutation {
    pub fn new(target: MutationTarget, operation: Operation, value: impl Into<Expression>) -> Self {
        Self {
            target,
            operation,
            value: value.into(),
            count: None,
            condition: None,
            condition_text: None,
            hidden: false,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<Expression>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}
