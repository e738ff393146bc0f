//! Resource, tag and item state with committed and preview layers.
//!
//! The committed layer is what has actually happened. The preview layer is
//! the committed layer with every active toggle's mutations replayed on
//! top; expressions always read the preview layer.

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::warn;

use crate::core::expr::{self, StateView};
use crate::core::overlay::ToggleOverlay;
use crate::core::random::RandomSource;
use crate::schema::content::GameContent;
use crate::schema::event::{Mutation, MutationTarget, Operation};
use crate::schema::value::{Expression, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState {
    pub id: String,
    pub name: String,
    /// Preview value.
    pub current: Value,
    pub committed: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Expression>,
}

impl ResourceState {
    fn slot(&mut self, layer: Layer) -> &mut Value {
        match layer {
            Layer::Committed => &mut self.committed,
            Layer::Preview => &mut self.current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Committed,
    Preview,
}

/// What a commit covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitKey {
    All,
    Tags,
    Items,
    Resource(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Applied; carries the value the mutation's expression resolved to.
    Applied(Value),
    /// Guard failed, or the mutation was invalid.
    Skipped,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Everything evaluation needs besides the state itself.
pub struct EvalEnv<'a> {
    pub rng: &'a mut dyn RandomSource,
    pub requirements_met: bool,
}

impl<'a> EvalEnv<'a> {
    pub fn new(rng: &'a mut dyn RandomSource) -> Self {
        Self {
            rng,
            requirements_met: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GameState {
    resources: Vec<ResourceState>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
    tags: Vec<String>,
    committed_tags: Vec<String>,
    items: Vec<String>,
    committed_items: Vec<String>,
}

struct PreviewView<'a> {
    state: &'a GameState,
    requirements_met: bool,
}

impl StateView for PreviewView<'_> {
    fn resource_value(&self, id: &str) -> Option<Value> {
        self.state.resource(id).map(|r| r.current.clone())
    }

    fn tags(&self) -> Vec<String> {
        self.state.tags.clone()
    }

    fn items(&self) -> Vec<String> {
        self.state.items.clone()
    }

    fn requirements_met(&self) -> bool {
        self.requirements_met
    }
}

impl GameState {
    pub fn from_content(content: &GameContent) -> Self {
        let mut state = Self::default();
        for (id, def) in content.resources.iter() {
            state.index.insert(id.to_string(), state.resources.len());
            state.resources.push(ResourceState {
                id: id.to_string(),
                name: def.name.clone(),
                current: def.value.clone(),
                committed: def.initial_committed(),
                max: def.max_value.clone(),
                min: def.min_value.clone(),
            });
        }
        state
    }

    /// Evaluate an expression against the preview layer.
    pub fn evaluate(&self, source: &str, env: &mut EvalEnv<'_>) -> Value {
        let view = PreviewView {
            state: self,
            requirements_met: env.requirements_met,
        };
        expr::evaluate(source, &view, &mut *env.rng)
    }

    pub fn condition_holds(&self, condition: Option<&Expression>, env: &mut EvalEnv<'_>) -> bool {
        let view = PreviewView {
            state: self,
            requirements_met: env.requirements_met,
        };
        expr::condition_holds(condition, &view, &mut *env.rng)
    }

    /// Apply one mutation to the given layer.
    ///
    /// The guard and the value are evaluated against the preview layer
    /// before anything changes.
    pub fn apply_mutation(
        &mut self,
        mutation: &Mutation,
        layer: Layer,
        env: &mut EvalEnv<'_>,
    ) -> MutationOutcome {
        if !self.condition_holds(mutation.condition.as_ref(), env) {
            return MutationOutcome::Skipped;
        }
        if !mutation.operation.applies_to(&mutation.target) {
            warn!(
                target_id = %mutation.target,
                operation = mutation.operation.as_str(),
                "mutation_operation_invalid"
            );
            return MutationOutcome::Skipped;
        }

        let value = self.evaluate(mutation.value.as_str(), env);
        match &mutation.target {
            MutationTarget::Tags => {
                let tag = value.to_string();
                let tags = match layer {
                    Layer::Committed => &mut self.committed_tags,
                    Layer::Preview => &mut self.tags,
                };
                if mutation.operation == Operation::Add {
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                } else {
                    tags.retain(|t| *t != tag);
                }
            }
            MutationTarget::Items => {
                let item = value.to_string();
                let count = mutation.count.unwrap_or(1) as usize;
                let items = match layer {
                    Layer::Committed => &mut self.committed_items,
                    Layer::Preview => &mut self.items,
                };
                if mutation.operation == Operation::Add {
                    items.extend(std::iter::repeat(item).take(count));
                } else if count == 0 {
                    items.retain(|i| *i != item);
                } else {
                    for _ in 0..count {
                        match items.iter().position(|i| *i == item) {
                            Some(pos) => {
                                items.remove(pos);
                            }
                            None => break,
                        }
                    }
                }
            }
            MutationTarget::Resource(id) => {
                let Some(&pos) = self.index.get(id) else {
                    warn!(resource = %id, "mutation_unknown_resource");
                    return MutationOutcome::Skipped;
                };
                let slot = self.resources[pos].slot(layer);
                *slot = combine(slot, &mutation.operation, &value);
                self.clamp(pos, layer, env);
            }
        }
        MutationOutcome::Applied(value)
    }

    /// Reset the preview layer to the committed layer and replay the
    /// overlay on top. Calling it twice gives the same state.
    pub fn recompute_preview(&mut self, overlay: &ToggleOverlay, env: &mut EvalEnv<'_>) {
        for resource in &mut self.resources {
            resource.current = resource.committed.clone();
        }
        self.tags = self.committed_tags.clone();
        self.items = self.committed_items.clone();

        for entry in overlay.entries() {
            self.apply_mutation(&entry.mutation, Layer::Preview, env);
        }
        for pos in 0..self.resources.len() {
            self.clamp(pos, Layer::Preview, env);
        }
    }

    /// Make preview values permanent and drop the overlay entries that
    /// produced them.
    pub fn commit(&mut self, key: CommitKey, overlay: &mut ToggleOverlay, env: &mut EvalEnv<'_>) {
        match key {
            CommitKey::All => {
                for resource in &mut self.resources {
                    resource.committed = resource.current.clone();
                    overlay.discard_target(&MutationTarget::Resource(resource.id.clone()));
                }
                self.commit_tags(overlay);
                self.commit_items(overlay);
            }
            CommitKey::Tags => self.commit_tags(overlay),
            CommitKey::Items => self.commit_items(overlay),
            CommitKey::Resource(id) => {
                let Some(&pos) = self.index.get(&id) else {
                    warn!(resource = %id, "commit_unknown_resource");
                    return;
                };
                let resource = &mut self.resources[pos];
                resource.committed = resource.current.clone();
                overlay.discard_target(&MutationTarget::Resource(id));
            }
        }
        self.recompute_preview(overlay, env);
    }

    fn commit_tags(&mut self, overlay: &mut ToggleOverlay) {
        self.committed_tags = self.tags.clone();
        overlay.discard_target(&MutationTarget::Tags);
    }

    fn commit_items(&mut self, overlay: &mut ToggleOverlay) {
        self.committed_items = self.items.clone();
        overlay.discard_target(&MutationTarget::Items);
    }

    fn clamp(&mut self, pos: usize, layer: Layer, env: &mut EvalEnv<'_>) {
        let resource = &self.resources[pos];
        let (max, min) = (resource.max.clone(), resource.min.clone());
        let max = max.map(|e| self.evaluate(e.as_str(), env));
        let min = min.map(|e| self.evaluate(e.as_str(), env));

        let slot = self.resources[pos].slot(layer);
        let Value::Number(mut n) = *slot else {
            return;
        };
        if let Some(bound) = max.map(|v| v.as_number()).filter(|b| !b.is_nan()) {
            n = n.min(bound);
        }
        if let Some(bound) = min.map(|v| v.as_number()).filter(|b| !b.is_nan()) {
            n = n.max(bound);
        }
        *slot = Value::Number(n);
    }

    pub fn resources(&self) -> &[ResourceState] {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceState> {
        self.index.get(id).map(|&pos| &self.resources[pos])
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn committed_tags(&self) -> &[String] {
        &self.committed_tags
    }

    pub fn committed_items(&self) -> &[String] {
        &self.committed_items
    }

    /// Preview items with their multiplicity, in first-seen order.
    pub fn item_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for item in &self.items {
            match counts.iter_mut().find(|(name, _)| name == item) {
                Some((_, n)) => *n += 1,
                None => counts.push((item.clone(), 1)),
            }
        }
        counts
    }
}

fn combine(current: &Value, op: &Operation, value: &Value) -> Value {
    let arithmetic = |f: fn(f64, f64) -> f64| Value::Number(f(current.as_number(), value.as_number()).floor());
    match op {
        Operation::Assign => value.clone(),
        Operation::Increase => arithmetic(|a, b| a + b),
        Operation::Decrease => arithmetic(|a, b| a - b),
        Operation::Multiply => arithmetic(|a, b| a * b),
        Operation::Divide => arithmetic(|a, b| a / b),
        _ => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::ScriptedRandom;
    use crate::schema::event::GameEvent;
    use crate::schema::resource::ResourceDef;

    fn content() -> GameContent {
        let mut content = GameContent::default();
        content.resources.insert("stamina", ResourceDef::new("Stamina", 5));
        content
            .resources
            .insert("hp", ResourceDef::new("Health", 8).with_max("stamina * 2").with_min("0"));
        content.resources.insert("blessed", ResourceDef::new("Blessed", false));
        content
    }

    fn hp(op: Operation, value: &str) -> Mutation {
        Mutation::new(MutationTarget::Resource("hp".into()), op, value)
    }

    fn number(state: &GameState, id: &str) -> f64 {
        state.resource(id).unwrap().current.as_number()
    }

    #[test]
    fn initial_state_from_content() {
        let mut content = content();
        let mut gold = ResourceDef::new("Gold", 1);
        gold.real_value = Some(Value::Number(4.0));
        content.resources.insert("gold", gold);
        let state = GameState::from_content(&content);
        let gold = state.resource("gold").unwrap();
        assert_eq!(gold.current, Value::Number(1.0));
        assert_eq!(gold.committed, Value::Number(4.0));
        assert_eq!(state.resources().len(), 4);
    }

    #[test]
    fn resource_stays_within_bounds() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());

        state.apply_mutation(&hp(Operation::Increase, "100"), Layer::Preview, &mut env);
        assert_eq!(number(&state, "hp"), 10.0);
        state.apply_mutation(&hp(Operation::Decrease, "100"), Layer::Preview, &mut env);
        assert_eq!(number(&state, "hp"), 0.0);
        state.apply_mutation(&hp(Operation::Assign, "7"), Layer::Preview, &mut env);
        state.apply_mutation(&hp(Operation::Divide, "2"), Layer::Preview, &mut env);
        assert_eq!(number(&state, "hp"), 3.0);
    }

    #[test]
    fn bounds_follow_other_resources_on_recompute() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());
        let mut overlay = ToggleOverlay::new();
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(number(&state, "hp"), 8.0);

        overlay.activate(
            "btn_0",
            &[GameEvent::SetValue(Mutation::new(
                MutationTarget::Resource("stamina".into()),
                Operation::Assign,
                "3",
            ))],
        );
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(number(&state, "hp"), 6.0);
    }

    #[test]
    fn tags_are_a_set() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());
        let add = Mutation::new(MutationTarget::Tags, Operation::Add, "\"x\"");
        let remove = Mutation::new(MutationTarget::Tags, Operation::Remove, "\"x\"");

        state.apply_mutation(&add, Layer::Preview, &mut env);
        state.apply_mutation(&add, Layer::Preview, &mut env);
        assert_eq!(state.tags(), ["x".to_string()]);
        assert_eq!(state.evaluate("tags << \"x\"", &mut env), Value::Bool(true));
        state.apply_mutation(&remove, Layer::Preview, &mut env);
        assert_eq!(state.evaluate("tags << \"x\"", &mut env), Value::Bool(false));
    }

    #[test]
    fn items_are_a_multiset() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());
        let add = Mutation::new(MutationTarget::Items, Operation::Add, "\"arrow\"").with_count(3);
        state.apply_mutation(&add, Layer::Preview, &mut env);
        state.apply_mutation(
            &Mutation::new(MutationTarget::Items, Operation::Add, "\"rope\""),
            Layer::Preview,
            &mut env,
        );
        assert_eq!(
            state.item_counts(),
            vec![("arrow".to_string(), 3), ("rope".to_string(), 1)]
        );

        let remove_two = Mutation::new(MutationTarget::Items, Operation::Remove, "\"arrow\"").with_count(2);
        state.apply_mutation(&remove_two, Layer::Preview, &mut env);
        assert_eq!(state.item_counts()[0], ("arrow".to_string(), 1));

        state.apply_mutation(&add, Layer::Preview, &mut env);
        let remove_all = Mutation::new(MutationTarget::Items, Operation::Remove, "\"arrow\"").with_count(0);
        state.apply_mutation(&remove_all, Layer::Preview, &mut env);
        assert_eq!(state.items(), ["rope".to_string()]);

        let remove_missing = Mutation::new(MutationTarget::Items, Operation::Remove, "\"arrow\"").with_count(5);
        assert!(state.apply_mutation(&remove_missing, Layer::Preview, &mut env).is_applied());
        assert_eq!(state.items().len(), 1);
    }

    #[test]
    fn guard_and_invalid_mutations_skip() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());

        let guarded = hp(Operation::Increase, "1").with_condition("blessed");
        assert_eq!(state.apply_mutation(&guarded, Layer::Preview, &mut env), MutationOutcome::Skipped);
        assert_eq!(number(&state, "hp"), 8.0);

        let unknown = Mutation::new(MutationTarget::Resource("mana".into()), Operation::Increase, "1");
        assert_eq!(state.apply_mutation(&unknown, Layer::Preview, &mut env), MutationOutcome::Skipped);

        let wrong_op = Mutation::new(MutationTarget::Tags, Operation::Increase, "1");
        assert_eq!(state.apply_mutation(&wrong_op, Layer::Preview, &mut env), MutationOutcome::Skipped);
        assert!(state.tags().is_empty());
    }

    #[test]
    fn overlay_replay_is_order_sensitive() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut content = GameContent::default();
        content.resources.insert("x", ResourceDef::new("X", 3));
        let mut state = GameState::from_content(&content);
        let double = GameEvent::SetValue(Mutation::new(MutationTarget::Resource("x".into()), Operation::Multiply, "2"));
        let inc = GameEvent::SetValue(Mutation::new(MutationTarget::Resource("x".into()), Operation::Increase, "1"));

        let mut overlay = ToggleOverlay::new();
        overlay.activate("a", &[double.clone()]);
        overlay.activate("b", &[inc.clone()]);
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(number(&state, "x"), 7.0);

        let mut overlay = ToggleOverlay::new();
        overlay.activate("b", &[inc]);
        overlay.activate("a", &[double]);
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(number(&state, "x"), 8.0);
    }

    #[test]
    fn recompute_is_idempotent_and_toggle_round_trips() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());
        let mut overlay = ToggleOverlay::new();
        state.recompute_preview(&overlay, &mut env);
        let before = state.clone();

        overlay.activate(
            "btn_3",
            &[
                GameEvent::SetValue(hp(Operation::Decrease, "3")),
                GameEvent::SetValue(Mutation::new(MutationTarget::Tags, Operation::Add, "\"hurt\"")),
            ],
        );
        state.recompute_preview(&overlay, &mut env);
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(number(&state, "hp"), 5.0);
        assert_eq!(state.tags(), ["hurt".to_string()]);

        overlay.deactivate("btn_3");
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(state.resources(), before.resources());
        assert_eq!(state.tags(), before.tags());
    }

    #[test]
    fn commit_makes_preview_permanent() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());
        let mut overlay = ToggleOverlay::new();
        overlay.activate(
            "btn_0",
            &[
                GameEvent::SetValue(hp(Operation::Decrease, "2")),
                GameEvent::SetValue(Mutation::new(MutationTarget::Tags, Operation::Add, "\"scarred\"")),
            ],
        );
        state.recompute_preview(&overlay, &mut env);

        state.commit(CommitKey::Resource("hp".into()), &mut overlay, &mut env);
        assert_eq!(state.resource("hp").unwrap().committed, Value::Number(6.0));
        assert_eq!(overlay.len(), 1);
        assert_eq!(number(&state, "hp"), 6.0);

        state.commit(CommitKey::All, &mut overlay, &mut env);
        assert!(overlay.is_empty());
        assert_eq!(state.committed_tags(), ["scarred".to_string()]);
        assert_eq!(state.tags(), ["scarred".to_string()]);
    }

    #[test]
    fn committed_layer_mutation_survives_recompute() {
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut env = EvalEnv::new(&mut rng);
        let mut state = GameState::from_content(&content());
        let overlay = ToggleOverlay::new();
        state.apply_mutation(&hp(Operation::Decrease, "5"), Layer::Committed, &mut env);
        state.recompute_preview(&overlay, &mut env);
        assert_eq!(number(&state, "hp"), 3.0);
    }
}
