//! Render items: the content the view draws, including selectable options.

use serde::{Deserialize, Serialize};

use super::event::GameEvent;
use super::story::Branch;
use super::value::Expression;

/// One renderable item of intro, category, page or ending content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Textbox {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f32>,
    },
    Titlebox {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f32>,
    },
    Button(OptionDef),
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f32>,
    },
    Line,
    Choice(ChoiceGroup),
    Spacer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    #[serde(other)]
    Unknown,
}

impl Element {
    /// Every selectable option in this element, including the members of a
    /// choice group.
    pub fn options(&self) -> Vec<&OptionDef> {
        match self {
            Self::Button(def) => vec![def],
            Self::Choice(group) => group.elements.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// A group of options where picking one locks the rest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoiceGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub elements: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

/// How an option reacts to being picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Flips on and off; while on, its mutations sit in the preview overlay.
    Toggle,
    /// Fires its events immediately and follows its branches.
    #[default]
    Once,
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        if s == "toggle" {
            Self::Toggle
        } else {
            Self::Once
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Toggle => "toggle".to_string(),
            ActionKind::Once => "once".to_string(),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A selectable option as authored (a "button").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Enabled while this evaluates true. Absent means always.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_text: Option<String>,
    /// Hide the option (instead of disabling it) while its condition fails.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, rename = "actionType")]
    pub action: ActionKind,
    #[serde(default)]
    pub events: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Vec<Branch>>,
}
