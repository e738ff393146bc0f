/// Expression and state integration tests — evaluation against live state,
/// preview replay and commits.

use choice_engine::core::expr;
use choice_engine::core::overlay::ToggleOverlay;
use choice_engine::core::random::{ScriptedRandom, SeededRandom};
use choice_engine::core::state::{CommitKey, EvalEnv, GameState, Layer, MutationOutcome};
use choice_engine::schema::{DocumentKind, GameContent, GameEvent, Mutation, MutationTarget, Operation, Value};

const RESOURCES: &str = r#"{
    "gold": {"name": "Gold", "value": 10},
    "hp": {"name": "HP", "value": 8, "maxValue": "max_hp", "minValue": "0"},
    "max_hp": {"name": "Max HP", "value": 10},
    "brave": {"name": "Brave", "value": true}
}"#;

fn state() -> GameState {
    let content = GameContent::default()
        .with_json(DocumentKind::Resources, RESOURCES)
        .unwrap();
    GameState::from_content(&content)
}

fn gold(operation: Operation, value: &str) -> Mutation {
    Mutation::new(MutationTarget::Resource("gold".into()), operation, value)
}

fn hp(operation: Operation, value: &str) -> Mutation {
    Mutation::new(MutationTarget::Resource("hp".into()), operation, value)
}

fn set_value(mutation: Mutation) -> GameEvent {
    GameEvent::SetValue(mutation)
}

#[test]
fn arithmetic_precedence_and_flooring() {
    let state = state();
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    assert_eq!(state.evaluate("3 + 4 * 2", &mut env), Value::Number(11.0));
    assert_eq!(state.evaluate("(3 + 4) * 2", &mut env), Value::Number(14.0));
    assert_eq!(state.evaluate("-7 / 2", &mut env), Value::Number(-4.0));
    assert_eq!(state.evaluate("gold / 3", &mut env), Value::Number(3.0));
    assert_eq!(state.evaluate("gold % 4 + hp", &mut env), Value::Number(10.0));
}

#[test]
fn logic_over_resources() {
    let state = state();
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    assert_eq!(state.evaluate("gold >= 10 && brave", &mut env), Value::Bool(true));
    assert_eq!(state.evaluate("hp > max_hp || gold < 5", &mut env), Value::Bool(false));
    assert_eq!(state.evaluate("gold == 10 ^^ brave", &mut env), Value::Bool(false));
}

#[test]
fn tag_and_item_membership() {
    let mut state = state();
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    let add_tag = Mutation::new(MutationTarget::Tags, Operation::Add, "\"scout\"");
    state.apply_mutation(&add_tag, Layer::Preview, &mut env);

    assert_eq!(state.evaluate("tags << \"scout\"", &mut env), Value::Bool(true));
    assert_eq!(state.evaluate("\"scout\" >> tags", &mut env), Value::Bool(true));
    assert_eq!(state.evaluate("tags << \"noble\"", &mut env), Value::Bool(false));
    assert_eq!(state.evaluate("items << \"scout\"", &mut env), Value::Bool(false));
}

#[test]
fn requirements_flag_reaches_expressions() {
    let state = state();
    let mut rng = SeededRandom::new(1);
    let mut env = EvalEnv::new(&mut rng);
    assert_eq!(state.evaluate("required", &mut env), Value::Bool(false));
    env.requirements_met = true;
    assert_eq!(state.evaluate("required", &mut env), Value::Bool(true));
}

#[test]
fn bounds_are_expressions_evaluated_on_every_clamp() {
    let mut state = state();
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    state.apply_mutation(&hp(Operation::Increase, "5"), Layer::Preview, &mut env);
    assert_eq!(state.resource("hp").unwrap().current, Value::Number(10.0));

    let raise_cap = Mutation::new(MutationTarget::Resource("max_hp".into()), Operation::Assign, "20");
    state.apply_mutation(&raise_cap, Layer::Preview, &mut env);
    state.apply_mutation(&hp(Operation::Increase, "5"), Layer::Preview, &mut env);
    assert_eq!(state.resource("hp").unwrap().current, Value::Number(15.0));

    state.apply_mutation(&hp(Operation::Decrease, "40"), Layer::Preview, &mut env);
    assert_eq!(state.resource("hp").unwrap().current, Value::Number(0.0));
}

#[test]
fn guarded_mutation_is_skipped() {
    let mut state = state();
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    let guarded = gold(Operation::Increase, "5").with_condition("gold > 100");
    let outcome = state.apply_mutation(&guarded, Layer::Committed, &mut env);
    assert_eq!(outcome, MutationOutcome::Skipped);
    assert_eq!(state.resource("gold").unwrap().committed, Value::Number(10.0));

    let doubled = gold(Operation::Increase, "gold * 2");
    let outcome = state.apply_mutation(&doubled, Layer::Committed, &mut env);
    assert_eq!(outcome, MutationOutcome::Applied(Value::Number(20.0)));
    assert_eq!(state.resource("gold").unwrap().committed, Value::Number(30.0));
}

#[test]
fn item_remove_count_zero_removes_every_copy() {
    let mut state = state();
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    let add = Mutation::new(MutationTarget::Items, Operation::Add, "\"arrow\"").with_count(3);
    let add_bow = Mutation::new(MutationTarget::Items, Operation::Add, "\"bow\"");
    state.apply_mutation(&add, Layer::Preview, &mut env);
    state.apply_mutation(&add_bow, Layer::Preview, &mut env);
    assert_eq!(state.item_counts(), vec![("arrow".to_string(), 3), ("bow".to_string(), 1)]);

    let remove_one = Mutation::new(MutationTarget::Items, Operation::Remove, "\"arrow\"");
    state.apply_mutation(&remove_one, Layer::Preview, &mut env);
    assert_eq!(state.item_counts()[0], ("arrow".to_string(), 2));

    let remove_all = Mutation::new(MutationTarget::Items, Operation::Remove, "\"arrow\"").with_count(0);
    state.apply_mutation(&remove_all, Layer::Preview, &mut env);
    assert_eq!(state.items(), ["bow".to_string()]);
}

#[test]
fn recompute_preview_is_idempotent() {
    let mut state = state();
    let mut overlay = ToggleOverlay::new();
    overlay.activate(
        "bonus",
        &[
            set_value(gold(Operation::Increase, "5")),
            set_value(Mutation::new(MutationTarget::Tags, Operation::Add, "\"rich\"")),
        ],
    );
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);

    state.recompute_preview(&overlay, &mut env);
    let once = state.clone();
    state.recompute_preview(&overlay, &mut env);

    assert_eq!(state.resources(), once.resources());
    assert_eq!(state.tags(), once.tags());
    assert_eq!(state.resource("gold").unwrap().current, Value::Number(15.0));
    assert_eq!(state.resource("gold").unwrap().committed, Value::Number(10.0));
}

#[test]
fn overlay_replays_in_activation_order() {
    let double = set_value(gold(Operation::Multiply, "2"));
    let add = set_value(gold(Operation::Increase, "5"));

    let mut rng = ScriptedRandom::new(vec![0.0]);

    let mut doubled_first = state();
    let mut overlay = ToggleOverlay::new();
    overlay.activate("double", std::slice::from_ref(&double));
    overlay.activate("add", std::slice::from_ref(&add));
    doubled_first.recompute_preview(&overlay, &mut EvalEnv::new(&mut rng));

    let mut added_first = state();
    let mut overlay = ToggleOverlay::new();
    overlay.activate("add", std::slice::from_ref(&add));
    overlay.activate("double", std::slice::from_ref(&double));
    added_first.recompute_preview(&overlay, &mut EvalEnv::new(&mut rng));

    assert_eq!(doubled_first.resource("gold").unwrap().current, Value::Number(25.0));
    assert_eq!(added_first.resource("gold").unwrap().current, Value::Number(30.0));
}

#[test]
fn commit_keeps_preview_and_drops_overlay_entries() {
    let mut state = state();
    let mut overlay = ToggleOverlay::new();
    overlay.activate(
        "kit",
        &[
            set_value(gold(Operation::Decrease, "4")),
            set_value(Mutation::new(MutationTarget::Items, Operation::Add, "\"rope\"")),
        ],
    );
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let mut env = EvalEnv::new(&mut rng);
    state.recompute_preview(&overlay, &mut env);

    state.commit(CommitKey::Resource("gold".into()), &mut overlay, &mut env);
    assert_eq!(state.resource("gold").unwrap().committed, Value::Number(6.0));
    assert_eq!(state.resource("gold").unwrap().current, Value::Number(6.0));
    assert_eq!(overlay.len(), 1);
    assert!(state.committed_items().is_empty());

    state.commit(CommitKey::All, &mut overlay, &mut env);
    assert!(overlay.is_empty());
    assert_eq!(state.committed_items(), ["rope".to_string()]);
}

#[test]
fn random_draws_come_from_the_source() {
    let state = state();
    let mut rng = ScriptedRandom::new(vec![0.5, 0.9]);
    let mut env = EvalEnv::new(&mut rng);
    assert_eq!(state.evaluate("random * 10", &mut env), Value::Number(5.0));
    assert_eq!(state.evaluate("random * 10", &mut env), Value::Number(9.0));
    assert_eq!(state.evaluate("random * 10", &mut env), Value::Number(5.0));
}

#[test]
fn identifiers_report_bare_names() {
    assert_eq!(
        expr::identifiers("gold > 2 && tags << \"x\" || hp < max_hp"),
        vec!["gold".to_string(), "hp".to_string(), "max_hp".to_string()]
    );
    assert_eq!(expr::unknown_characters("gold @ 2"), vec!['@']);
}
