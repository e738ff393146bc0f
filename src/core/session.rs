//! A play session: the story flow from intro to summary.
//!
//! The session owns the game state, the toggle overlay, every selectable
//! option, the event log and the random source. Content is shared read-only.

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::log::EventLog;
use crate::core::options::{CategoryLimit, LockReason, OptionRegistry, SelectableOption};
use crate::core::overlay::ToggleOverlay;
use crate::core::random::{RandomSource, SeededRandom};
use crate::core::selection::{select_top_priority, select_weighted};
use crate::core::state::{CommitKey, EvalEnv, GameState, Layer, MutationOutcome};
use crate::core::summary::{self, OptionEffects, Status, Summary};
use crate::schema::content::{ContentError, GameContent};
use crate::schema::element::{ActionKind, ChoiceGroup, Element, OptionDef};
use crate::schema::event::GameEvent;
use crate::schema::story::{Branch, BranchTarget, Ending, StoryNode};
use crate::schema::value::{Expression, Value};

/// Upper bound on refresh passes. A pass that deactivates a toggle starts
/// another pass; content whose toggles keep invalidating each other stops
/// here.
pub const MAX_REFRESH_PASSES: usize = 32;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("option is hidden or locked: {0}")]
    OptionUnavailable(String),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Intro,
    Customization,
    EventLoop,
    Ending,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Intro,
    Category,
    Page,
    Ending,
    /// A single call-to-action group (confirm, view summary).
    Action,
    Summary,
}

/// Content the renderer should append, with option and group ids filled in
/// so they can be passed back to [`Session::activate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBlock {
    pub kind: BlockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    pub elements: Vec<Element>,
}

impl RenderBlock {
    fn new(kind: BlockKind, heading: Option<String>, elements: Vec<Element>) -> Self {
        Self {
            kind,
            heading,
            description: None,
            rules: None,
            elements,
        }
    }
}

pub struct Session {
    content: Arc<GameContent>,
    state: GameState,
    overlay: ToggleOverlay,
    options: OptionRegistry,
    limits: Vec<CategoryLimit>,
    log: EventLog,
    rng: Box<dyn RandomSource>,
    phase: Phase,
    started: bool,
    round: u32,
    current_node: Option<String>,
    completed: FxHashSet<String>,
    ending: Option<String>,
    blocks: Vec<RenderBlock>,
    summary: Option<Summary>,
    max_refresh_passes: usize,
    dev: bool,
}

/// Builder for constructing a `Session`.
pub struct SessionBuilder {
    seed: u64,
    content: Option<Arc<GameContent>>,
    content_dir: Option<PathBuf>,
    random: Option<Box<dyn RandomSource>>,
    max_refresh_passes: usize,
    dev: bool,
}

impl SessionBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn content(mut self, content: GameContent) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    pub fn shared_content(mut self, content: Arc<GameContent>) -> Self {
        self.content = Some(content);
        self
    }

    /// Load content from a directory of documents at build time. Ignored
    /// when content was provided directly.
    pub fn content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = Some(dir.into());
        self
    }

    /// Replace the seeded source (for scripted tests).
    pub fn random_source(mut self, source: impl RandomSource + 'static) -> Self {
        self.random = Some(Box::new(source));
        self
    }

    pub fn max_refresh_passes(mut self, passes: usize) -> Self {
        self.max_refresh_passes = passes.max(1);
        self
    }

    /// Development mode: hidden options and resources stay visible.
    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn build(self) -> Result<Session, SessionError> {
        let content = match (self.content, self.content_dir) {
            (Some(content), _) => content,
            (None, Some(dir)) => Arc::new(GameContent::load_dir(&dir)?),
            (None, None) => Arc::new(GameContent::default()),
        };
        let rng = self
            .random
            .unwrap_or_else(|| Box::new(SeededRandom::new(self.seed)) as Box<dyn RandomSource>);

        Ok(Session {
            state: GameState::from_content(&content),
            content,
            overlay: ToggleOverlay::new(),
            options: OptionRegistry::new(),
            limits: Vec::new(),
            log: EventLog::new(),
            rng,
            phase: Phase::Intro,
            started: false,
            round: 0,
            current_node: None,
            completed: FxHashSet::default(),
            ending: None,
            blocks: Vec::new(),
            summary: None,
            max_refresh_passes: self.max_refresh_passes,
            dev: self.dev,
        })
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder {
            seed: 0,
            content: None,
            content_dir: None,
            random: None,
            max_refresh_passes: MAX_REFRESH_PASSES,
            dev: false,
        }
    }

    /// Show the intro.
    pub fn start(&mut self) {
        if self.started {
            warn!("session_already_started");
            return;
        }
        self.started = true;
        let content = Arc::clone(&self.content);
        let elements = self.register_elements(&content.intro, None);
        self.blocks
            .push(RenderBlock::new(BlockKind::Intro, None, elements));
        self.refresh();
    }

    /// Pick an option by id.
    ///
    /// Toggle options flip on or off and move their mutations in or out of
    /// the preview overlay. Once options run their events, lock the rest of
    /// their choice group and follow their branches.
    pub fn activate(&mut self, id: &str) -> Result<(), SessionError> {
        let option = self
            .options
            .get(id)
            .ok_or_else(|| SessionError::UnknownOption(id.to_string()))?;
        if !option.enabled() {
            return Err(SessionError::OptionUnavailable(id.to_string()));
        }
        let option = option.clone();
        debug!(option = id, toggle = option.is_toggle(), "option_activated");

        if option.is_toggle() {
            let now_active = !option.active;
            if let Some(o) = self.options.get_mut(id) {
                o.active = now_active;
            }
            if now_active {
                self.overlay.activate(id, &option.events);
            } else {
                self.overlay.deactivate(id);
            }
        } else {
            if self.phase == Phase::EventLoop {
                self.log.record_choice(option.label());
            }
            if let Some(o) = self.options.get_mut(id) {
                o.picked = true;
            }
            self.execute_events(&option.events, true);
            if let Some(group) = &option.group {
                self.options.lock_group(group, LockReason::Choice);
            }
            if let Some(branches) = &option.branch {
                self.handle_branches(branches);
            }
        }

        self.refresh();
        Ok(())
    }

    /// Run events against the committed state. `log` records applied
    /// mutations in the open log entry while the story loop is running.
    pub fn execute_events(&mut self, events: &[GameEvent], log: bool) {
        for event in events {
            match event {
                GameEvent::StartCustomization => self.start_customization(),
                GameEvent::StartEventLoop => self.start_event_loop(),
                GameEvent::SetValue(mutation) => {
                    let mut env = EvalEnv {
                        rng: self.rng.as_mut(),
                        requirements_met: self.options.requirements_met(&self.limits),
                    };
                    let outcome = self
                        .state
                        .apply_mutation(mutation, Layer::Committed, &mut env);
                    if let MutationOutcome::Applied(resolved) = outcome {
                        if log && self.phase == Phase::EventLoop {
                            self.log.record_mutation(mutation, resolved);
                        }
                    }
                    self.refresh();
                }
                GameEvent::ViewSummary => self.show_summary(),
                GameEvent::Unknown => debug!("unknown_event_ignored"),
            }
        }
    }

    /// Recompute the preview and every option's visibility and locks.
    ///
    /// Hiding an active toggle deactivates it, which changes the preview,
    /// which can hide further toggles; passes repeat until nothing is
    /// deactivated. Skipped once the story has ended.
    pub fn refresh(&mut self) {
        if matches!(self.phase, Phase::Ending | Phase::Summary) {
            return;
        }

        for _ in 0..self.max_refresh_passes {
            let mut env = EvalEnv {
                rng: self.rng.as_mut(),
                requirements_met: self.options.requirements_met(&self.limits),
            };
            self.state.recompute_preview(&self.overlay, &mut env);

            let mut deactivated = false;
            for option in self.options.iter_mut() {
                let holds = self
                    .state
                    .condition_holds(option.condition.as_ref(), &mut env);
                if option.hidden && !holds && !self.dev {
                    option.visible = false;
                    if option.active {
                        option.active = false;
                        self.overlay.deactivate(&option.id);
                        deactivated = true;
                    }
                    continue;
                }
                option.visible = true;
                if option.active {
                    continue;
                }
                if holds {
                    option.lock_reasons.remove(&LockReason::Condition);
                } else {
                    option.lock_reasons.insert(LockReason::Condition);
                }
            }

            if !deactivated {
                self.options.apply_category_limits(&self.limits);
                return;
            }
        }

        warn!(passes = self.max_refresh_passes, "refresh_pass_limit_reached");
        self.options.apply_category_limits(&self.limits);
    }

    /// Evaluate an expression against the preview state.
    pub fn evaluate(&mut self, expression: &str) -> Value {
        let mut env = EvalEnv {
            rng: self.rng.as_mut(),
            requirements_met: self.options.requirements_met(&self.limits),
        };
        self.state.evaluate(expression, &mut env)
    }

    /// Make preview values permanent.
    pub fn commit(&mut self, key: CommitKey) {
        let mut env = EvalEnv {
            rng: self.rng.as_mut(),
            requirements_met: self.options.requirements_met(&self.limits),
        };
        self.state.commit(key, &mut self.overlay, &mut env);
    }

    /// What picking an option would do, described for display.
    pub fn option_effects(&mut self, id: &str) -> Option<OptionEffects> {
        let events = self.options.get(id)?.events.clone();
        let content = Arc::clone(&self.content);
        let mut env = EvalEnv {
            rng: self.rng.as_mut(),
            requirements_met: self.options.requirements_met(&self.limits),
        };
        let state = &self.state;
        Some(summary::describe_events(&content, &events, |m| {
            state.evaluate(m.value.as_str(), &mut env)
        }))
    }

    /// Status bar contents for the current preview.
    pub fn status(&mut self) -> Status {
        let content = Arc::clone(&self.content);
        let mut env = EvalEnv {
            rng: self.rng.as_mut(),
            requirements_met: self.options.requirements_met(&self.limits),
        };
        let state = &self.state;
        Status::build(&content, state, self.dev, |bound: &Expression| {
            state.evaluate(bound.as_str(), &mut env)
        })
    }

    /// Render blocks produced since the last call.
    pub fn take_blocks(&mut self) -> Vec<RenderBlock> {
        std::mem::take(&mut self.blocks)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn overlay(&self) -> &ToggleOverlay {
        &self.overlay
    }

    pub fn content(&self) -> &GameContent {
        &self.content
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Story nodes entered so far, counting the attempt that ended the story.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_node(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    pub fn ending(&self) -> Option<&str> {
        self.ending.as_deref()
    }

    pub fn option(&self, id: &str) -> Option<&SelectableOption> {
        self.options.get(id)
    }

    pub fn options(&self) -> impl Iterator<Item = &SelectableOption> {
        self.options.iter()
    }

    pub fn enabled_options(&self) -> impl Iterator<Item = &SelectableOption> {
        self.options.iter().filter(|o| o.enabled())
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// The recap, once the summary has been reached.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    fn register_elements(&mut self, elements: &[Element], category: Option<&str>) -> Vec<Element> {
        elements
            .iter()
            .map(|element| match element {
                Element::Button(def) => {
                    let mut def = def.clone();
                    def.id = Some(self.options.register(&def, category, None));
                    Element::Button(def)
                }
                Element::Choice(group) => {
                    let group_id = self.options.generate_id("choice");
                    let members = group
                        .elements
                        .iter()
                        .map(|def| {
                            let mut def = def.clone();
                            def.id = Some(self.options.register(&def, None, Some(&group_id)));
                            def
                        })
                        .collect();
                    Element::Choice(ChoiceGroup {
                        id: Some(group_id),
                        elements: members,
                        width: group.width,
                    })
                }
                other => other.clone(),
            })
            .collect()
    }

    /// A one-button choice group offered by the engine itself.
    fn action_block(&mut self, title: &str, condition: Option<&str>, event: GameEvent) {
        let def = OptionDef {
            title: Some(title.to_string()),
            condition: condition.map(Expression::from),
            action: ActionKind::Once,
            events: vec![event],
            ..OptionDef::default()
        };
        let group = Element::Choice(ChoiceGroup {
            id: None,
            elements: vec![def],
            width: Some(80.0),
        });
        let elements = self.register_elements(&[group], None);
        self.blocks
            .push(RenderBlock::new(BlockKind::Action, None, elements));
    }

    fn start_customization(&mut self) {
        if self.phase != Phase::Intro {
            warn!(phase = ?self.phase, "customization_already_started");
            return;
        }
        self.phase = Phase::Customization;
        info!(categories = self.content.custom.len(), "customization_started");

        let content = Arc::clone(&self.content);
        for (id, category) in content.custom.iter() {
            let elements = self.register_elements(&category.elements, Some(id));
            self.blocks.push(RenderBlock {
                kind: BlockKind::Category,
                heading: Some(category.name.clone()),
                description: category.description.clone(),
                rules: category.rules_text(),
                elements,
            });
            self.limits.push(CategoryLimit {
                id: id.to_string(),
                max_select: category.max_select.filter(|&n| n > 0),
                required: category.required.unwrap_or(0),
            });
        }

        self.action_block("Confirm", Some("required"), GameEvent::StartEventLoop);
        self.refresh();
    }

    fn start_event_loop(&mut self) {
        if !matches!(self.phase, Phase::Intro | Phase::Customization) {
            warn!(phase = ?self.phase, "event_loop_already_started");
            return;
        }
        self.phase = Phase::EventLoop;
        info!("event_loop_started");
        self.options.lock_all(LockReason::Customization);
        self.commit(CommitKey::All);
        self.enter_next_node();
    }

    fn enter_next_node(&mut self) {
        self.round += 1;
        let content = Arc::clone(&self.content);

        let mut env = EvalEnv {
            rng: self.rng.as_mut(),
            requirements_met: self.options.requirements_met(&self.limits),
        };
        let mut candidates: Vec<(&str, &StoryNode)> = Vec::new();
        for (id, node) in content.scenes.iter() {
            if !node.repeatable && self.completed.contains(id) {
                continue;
            }
            if self.state.condition_holds(node.condition.as_ref(), &mut env) {
                candidates.push((id, node));
            }
        }

        let max_round = content.settings.max_round;
        if (max_round != 0 && self.round > max_round) || candidates.is_empty() {
            debug!(round = self.round, candidates = candidates.len(), "story_loop_finished");
            self.enter_ending(None);
            return;
        }

        let Some(&(id, node)) = select_weighted(&candidates, self.rng.as_mut()) else {
            return;
        };
        if !node.repeatable {
            self.completed.insert(id.to_string());
        }

        let Some(page) = node.pages.get(node.start_page_id()) else {
            error!(node = id, page = node.start_page_id(), "start_page_missing");
            return;
        };

        info!(round = self.round, node = id, "story_node_entered");
        self.current_node = Some(id.to_string());
        self.log.begin(&node.title, &page.summary);
        let elements = self.register_elements(&page.elements, None);
        self.blocks.push(RenderBlock::new(
            BlockKind::Page,
            Some(format!("Day {}: {}", self.round, node.title)),
            elements,
        ));
    }

    fn handle_branches(&mut self, branches: &[Branch]) {
        let mut env = EvalEnv {
            rng: self.rng.as_mut(),
            requirements_met: self.options.requirements_met(&self.limits),
        };
        let eligible: Vec<&Branch> = branches
            .iter()
            .filter(|b| self.state.condition_holds(b.condition.as_ref(), &mut env))
            .collect();

        let target = match select_weighted(&eligible, self.rng.as_mut()) {
            Some(branch) => branch.target.clone(),
            None => BranchTarget::Next,
        };

        match target {
            BranchTarget::Page(page) => self.enter_page(&page),
            BranchTarget::Ending(ending) => {
                self.log.close();
                self.enter_ending(Some(&ending));
            }
            BranchTarget::Next => self.advance(),
        }
    }

    /// Leave the current node: run the transition events, close its log
    /// entry and pick the next node.
    fn advance(&mut self) {
        let content = Arc::clone(&self.content);
        self.execute_events(&content.settings.events, false);
        self.log.close();
        self.enter_next_node();
    }

    fn enter_page(&mut self, page_id: &str) {
        let content = Arc::clone(&self.content);
        let page = self
            .current_node
            .as_deref()
            .and_then(|node| content.scenes.get(node))
            .and_then(|node| node.pages.get(page_id));
        let Some(page) = page else {
            error!(node = ?self.current_node, page = page_id, "branch_page_missing");
            return;
        };

        debug!(page = page_id, "story_page_entered");
        self.log.push_page(&page.summary);
        let elements = self.register_elements(&page.elements, None);
        self.blocks
            .push(RenderBlock::new(BlockKind::Page, None, elements));
    }

    fn enter_ending(&mut self, id: Option<&str>) {
        let content = Arc::clone(&self.content);
        let selected: Option<(&str, &Ending)> = match id {
            Some(id) => match content.endings.get(id) {
                Some(ending) => Some((id, ending)),
                None => {
                    error!(ending = id, "ending_missing");
                    return;
                }
            },
            None => {
                let mut env = EvalEnv {
                    rng: self.rng.as_mut(),
                    requirements_met: self.options.requirements_met(&self.limits),
                };
                let eligible: Vec<(&str, &Ending)> = content
                    .endings
                    .iter()
                    .filter(|(_, e)| self.state.condition_holds(e.condition.as_ref(), &mut env))
                    .collect();
                select_top_priority(&eligible).copied()
            }
        };
        let Some((id, ending)) = selected else {
            warn!(round = self.round, "no_eligible_ending");
            return;
        };

        info!(ending = id, round = self.round, "ending_entered");
        self.phase = Phase::Ending;
        self.ending = Some(id.to_string());
        self.options.lock_all(LockReason::Ended);

        let elements = self.register_elements(&ending.elements, None);
        self.blocks.push(RenderBlock::new(
            BlockKind::Ending,
            Some(format!("Ending: {}", ending.title)),
            elements,
        ));
        self.action_block("View summary", None, GameEvent::ViewSummary);
    }

    fn show_summary(&mut self) {
        if self.phase != Phase::Ending {
            warn!(phase = ?self.phase, "summary_before_ending");
            return;
        }
        self.phase = Phase::Summary;
        self.options.lock_all(LockReason::Ended);
        self.summary = Some(Summary::build(
            &self.content,
            &self.state,
            &self.options,
            &self.log,
        ));
        self.blocks.push(RenderBlock::new(
            BlockKind::Summary,
            Some("Summary".to_string()),
            Vec::new(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::ScriptedRandom;
    use crate::schema::content::DocumentKind;

    const INTRO: &str = r#"[
        {"type": "textbox", "text": "Welcome."},
        {"type": "button", "id": "begin", "title": "Begin", "events": [{"type": "cyoaStart"}]}
    ]"#;

    const CUSTOM: &str = r#"{
        "origin": {"name": "Origin", "maxSelect": 1, "required": 1, "elements": [
            {"type": "button", "id": "noble", "title": "Noble", "actionType": "toggle",
             "events": [{"type": "setValue", "target": "gold", "operation": "+", "value": 10}]},
            {"type": "button", "id": "peasant", "title": "Peasant", "actionType": "toggle",
             "events": [{"type": "setValue", "target": "gold", "operation": "+", "value": 1}]}
        ]}
    }"#;

    const RESOURCES: &str = r#"{"gold": {"name": "Gold", "value": 0, "show": true, "summary": true}}"#;

    const SCENES: &str = r#"{
        "road": {"title": "Road", "repeatable": false, "pages": {
            "start": {"summary": "A fork in the road.", "elements": [
                {"type": "choice", "elements": [
                    {"type": "button", "id": "left", "title": "Left",
                     "events": [{"type": "setValue", "target": "gold", "operation": "-", "value": 1}],
                     "branch": [{"type": "page", "value": "camp"}]},
                    {"type": "button", "id": "right", "title": "Right", "branch": [{"type": "next"}]}
                ]}
            ]},
            "camp": {"summary": "You make camp.", "elements": [
                {"type": "button", "id": "sleep", "title": "Sleep", "branch": [{"type": "next"}]}
            ]}
        }}
    }"#;

    const ENDINGS: &str = r#"{
        "poor": {"title": "Poor", "elements": []},
        "rich": {"title": "Rich", "condition": "gold >= 10", "priority": 2, "elements": []}
    }"#;

    fn session() -> Session {
        let content = GameContent::default()
            .with_json(DocumentKind::Intro, INTRO)
            .and_then(|c| c.with_json(DocumentKind::Custom, CUSTOM))
            .and_then(|c| c.with_json(DocumentKind::Resources, RESOURCES))
            .and_then(|c| c.with_json(DocumentKind::Scenes, SCENES))
            .and_then(|c| c.with_json(DocumentKind::Endings, ENDINGS))
            .unwrap();
        let mut session = Session::builder()
            .content(content)
            .random_source(ScriptedRandom::new(vec![0.0]))
            .build()
            .unwrap();
        session.start();
        session
    }

    fn confirm_id(session: &Session) -> String {
        session
            .options()
            .find(|o| o.title.as_deref() == Some("Confirm"))
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn intro_registers_options() {
        let mut session = session();
        assert_eq!(session.phase(), Phase::Intro);
        let blocks = session.take_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Intro);
        assert!(session.option("begin").unwrap().enabled());
        assert!(session.take_blocks().is_empty());
    }

    #[test]
    fn customization_limits_and_requirements() {
        let mut session = session();
        session.activate("begin").unwrap();
        assert_eq!(session.phase(), Phase::Customization);
        let confirm = confirm_id(&session);
        assert!(!session.option(&confirm).unwrap().enabled());

        session.activate("noble").unwrap();
        assert_eq!(session.evaluate("gold"), Value::Number(10.0));
        assert!(session.option(&confirm).unwrap().enabled());
        let peasant = session.option("peasant").unwrap();
        assert!(peasant.lock_reasons.contains(&LockReason::Limit));
        assert!(matches!(
            session.activate("peasant"),
            Err(SessionError::OptionUnavailable(_))
        ));

        session.activate("noble").unwrap();
        assert_eq!(session.evaluate("gold"), Value::Number(0.0));
        assert!(session.option("peasant").unwrap().enabled());
    }

    #[test]
    fn full_story_reaches_summary() {
        let mut session = session();
        session.activate("begin").unwrap();
        session.activate("noble").unwrap();
        let confirm = confirm_id(&session);
        session.activate(&confirm).unwrap();

        assert_eq!(session.phase(), Phase::EventLoop);
        assert_eq!(session.round(), 1);
        assert_eq!(session.state().resource("gold").unwrap().committed, Value::Number(10.0));
        assert!(session
            .option("noble")
            .unwrap()
            .lock_reasons
            .contains(&LockReason::Customization));

        session.activate("left").unwrap();
        assert!(session
            .option("right")
            .unwrap()
            .lock_reasons
            .contains(&LockReason::Choice));
        session.activate("sleep").unwrap();

        // The only node is non-repeatable, so the loop ends here.
        assert_eq!(session.phase(), Phase::Ending);
        assert_eq!(session.ending(), Some("poor"));

        let view = session
            .options()
            .find(|o| o.title.as_deref() == Some("View summary"))
            .unwrap()
            .id
            .clone();
        session.activate(&view).unwrap();
        assert_eq!(session.phase(), Phase::Summary);

        let summary = session.summary().unwrap();
        assert_eq!(summary.customization[0].options, vec!["Noble".to_string()]);
        let node = &summary.nodes[0];
        assert_eq!(node.title, "Road");
        assert_eq!(node.segments.len(), 2);
        assert_eq!(node.segments[0].choice.as_deref(), Some("Left"));
        assert_eq!(node.segments[0].effects[0].text, "Gold -1");
        assert_eq!(node.segments[1].choice.as_deref(), Some("Sleep"));
    }

    #[test]
    fn unknown_option_is_an_error() {
        let mut session = session();
        assert!(matches!(
            session.activate("nope"),
            Err(SessionError::UnknownOption(_))
        ));
    }

    #[test]
    fn refresh_is_skipped_after_ending() {
        let mut session = session();
        session.activate("begin").unwrap();
        let confirm = confirm_id(&session);
        session.activate("noble").unwrap();
        session.activate(&confirm).unwrap();
        session.activate("right").unwrap();
        assert_eq!(session.phase(), Phase::Ending);
        assert_eq!(session.ending(), Some("rich"));
        assert!(!session.option("left").unwrap().enabled());
    }
}
