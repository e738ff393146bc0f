//! Human-readable effect lines, the status bar and the end-of-game recap.

use serde::Serialize;
use std::fmt::Write as _;

use crate::core::log::EventLog;
use crate::core::options::OptionRegistry;
use crate::core::state::GameState;
use crate::schema::content::GameContent;
use crate::schema::event::{GameEvent, Mutation, MutationTarget, Operation};
use crate::schema::value::{Expression, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Good,
    Bad,
    Neutral,
}

impl Tone {
    fn marker(&self) -> &'static str {
        match self {
            Self::Good => "+",
            Self::Bad => "-",
            Self::Neutral => "·",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectLine {
    pub text: String,
    pub tone: Tone,
}

/// Tone of a resource change: good when it moves the resource the way its
/// `positive` flag prefers.
pub fn effect_tone(content: &GameContent, mutation: &Mutation) -> Tone {
    let MutationTarget::Resource(id) = &mutation.target else {
        return Tone::Neutral;
    };
    let Some(positive) = content.resources.get(id).and_then(|r| r.positive) else {
        return Tone::Neutral;
    };
    let up = match mutation.operation {
        Operation::Increase | Operation::Multiply => true,
        Operation::Decrease | Operation::Divide => false,
        _ => return Tone::Neutral,
    };
    if positive == up {
        Tone::Good
    } else {
        Tone::Bad
    }
}

/// Describe one mutation. `None` for hidden mutations and for operations
/// that do not apply to their target.
pub fn describe_mutation(content: &GameContent, mutation: &Mutation, resolved: &Value) -> Option<EffectLine> {
    if mutation.hidden || !mutation.operation.applies_to(&mutation.target) {
        return None;
    }

    let mut text = String::new();
    if let Some(cond) = &mutation.condition_text {
        text.push_str(cond);
        text.push(' ');
    }

    let count = mutation.count.unwrap_or(1);
    match (&mutation.target, &mutation.operation) {
        (MutationTarget::Resource(id), op) => {
            let name = content
                .resources
                .get(id)
                .map(|r| r.name.as_str())
                .unwrap_or(id.as_str());
            let _ = match (op, resolved) {
                (Operation::Increase, _) => write!(text, "{} +{}", name, resolved),
                (Operation::Decrease, _) => write!(text, "{} -{}", name, resolved),
                (Operation::Multiply, _) => write!(text, "{} x{}", name, resolved),
                (Operation::Divide, _) => write!(text, "{} divided by {}", name, resolved),
                (_, Value::Bool(true)) => write!(text, "gained {}", name),
                (_, Value::Bool(false)) => write!(text, "lost {}", name),
                _ => write!(text, "{} set to {}", name, resolved),
            };
        }
        (MutationTarget::Tags, Operation::Add) => text.push_str(&format!("gained {}", resolved)),
        (MutationTarget::Tags, _) => text.push_str(&format!("lost {}", resolved)),
        (MutationTarget::Items, Operation::Add) => {
            text.push_str(&format!("gained {} x{}", resolved, count))
        }
        (MutationTarget::Items, _) if count == 0 => text.push_str(&format!("lost all {}", resolved)),
        (MutationTarget::Items, _) => text.push_str(&format!("lost {} x{}", resolved, count)),
    }

    Some(EffectLine {
        text,
        tone: effect_tone(content, mutation),
    })
}

/// What picking an option would do, for display next to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionEffects {
    /// Tags the option grants, shown as labels.
    pub tags: Vec<String>,
    pub lines: Vec<EffectLine>,
}

/// Describe every visible `setValue` event of an option. `resolve` supplies
/// the value each mutation would resolve to right now.
pub fn describe_events(
    content: &GameContent,
    events: &[GameEvent],
    mut resolve: impl FnMut(&Mutation) -> Value,
) -> OptionEffects {
    let mut effects = OptionEffects::default();
    for mutation in events.iter().filter_map(GameEvent::mutation) {
        if mutation.hidden {
            continue;
        }
        let resolved = resolve(mutation);
        if mutation.target == MutationTarget::Tags && mutation.operation == Operation::Add {
            effects.tags.push(resolved.to_string().replace('_', " "));
        } else if let Some(line) = describe_mutation(content, mutation, &resolved) {
            effects.lines.push(line);
        }
    }
    effects
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The status bar: shown resources and the item counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Status {
    pub resources: Vec<StatusLine>,
    pub items: Vec<(String, usize)>,
}

impl Status {
    /// `bound` evaluates a resource's max expression against the preview.
    /// `reveal_hidden` lists resources that are not shown.
    pub fn build(
        content: &GameContent,
        state: &GameState,
        reveal_hidden: bool,
        mut bound: impl FnMut(&Expression) -> Value,
    ) -> Self {
        let mut status = Status {
            items: state.item_counts(),
            ..Status::default()
        };
        for resource in state.resources() {
            let Some(def) = content.resources.get(&resource.id) else {
                continue;
            };
            let shown = def.show && (!def.show_if_positive || resource.current.truthy());
            if !shown && !reveal_hidden {
                continue;
            }
            let text = match (&resource.current, &resource.max) {
                (Value::Bool(_), _) => def.name.clone(),
                (value, Some(max)) => format!("{}: {}/{}", def.name, value, bound(max)),
                (value, None) => format!("{}: {}", def.name, value),
            };
            status.resources.push(StatusLine {
                id: resource.id.clone(),
                text,
                description: def.description.clone(),
            });
        }
        status
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResource {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChosenCategory {
    pub name: String,
    pub options: Vec<String>,
}

/// One page of a story node as it was played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    pub effects: Vec<EffectLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecap {
    pub title: String,
    pub segments: Vec<Segment>,
}

/// The end-of-game recap.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub resources: Vec<SummaryResource>,
    pub customization: Vec<ChosenCategory>,
    pub nodes: Vec<NodeRecap>,
}

impl Summary {
    pub fn build(
        content: &GameContent,
        state: &GameState,
        options: &OptionRegistry,
        log: &EventLog,
    ) -> Self {
        let resources = state
            .resources()
            .iter()
            .filter(|r| content.resources.get(&r.id).is_some_and(|def| def.summary))
            .map(|r| SummaryResource {
                name: r.name.clone(),
                value: r.current.clone(),
            })
            .collect();

        let customization = content
            .custom
            .iter()
            .filter_map(|(id, category)| {
                let chosen: Vec<String> = options
                    .iter()
                    .filter(|o| o.active && o.category.as_deref() == Some(id))
                    .map(|o| o.label().to_string())
                    .collect();
                (!chosen.is_empty()).then(|| ChosenCategory {
                    name: category.name.clone(),
                    options: chosen,
                })
            })
            .collect();

        let nodes = log
            .entries()
            .iter()
            .map(|entry| NodeRecap {
                title: entry.title.clone(),
                segments: entry
                    .summaries
                    .iter()
                    .enumerate()
                    .map(|(i, summary)| Segment {
                        summary: summary.clone(),
                        choice: entry.choices.get(i).cloned(),
                        effects: entry
                            .pages
                            .get(i)
                            .into_iter()
                            .flatten()
                            .filter_map(|logged| {
                                describe_mutation(content, &logged.mutation, &logged.resolved)
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            resources,
            customization,
            nodes,
        }
    }

    /// Plain-text rendering of the recap.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== Final state ==");
        for r in &self.resources {
            let _ = writeln!(out, "{}: {}", r.name, r.value);
        }
        if !self.customization.is_empty() {
            let _ = writeln!(out, "\n== Starting choices ==");
            for category in &self.customization {
                let _ = writeln!(out, "{}: {}", category.name, category.options.join(", "));
            }
        }
        let _ = writeln!(out, "\n== Story ==");
        for node in &self.nodes {
            let _ = writeln!(out, "{}", node.title);
            for segment in &node.segments {
                let _ = writeln!(out, "  {}", segment.summary);
                if let Some(choice) = &segment.choice {
                    let _ = writeln!(out, "  -> {}", choice);
                }
                for effect in &segment.effects {
                    let _ = writeln!(out, "     {} {}", effect.tone.marker(), effect.text);
                }
            }
        }
        out
    }
}
