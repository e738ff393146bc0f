//! Static checks over loaded content.

use crate::core::expr;
use crate::schema::content::GameContent;
use crate::schema::element::{Element, OptionDef};
use crate::schema::event::{GameEvent, MutationTarget};
use crate::schema::story::{Branch, BranchTarget, StoryNode};
use crate::schema::value::Expression;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

struct Linter<'a> {
    content: &'a GameContent,
    report: LintReport,
}

/// Check content for broken references and suspicious settings.
///
/// Errors are things the engine will trip over at runtime (missing pages,
/// unknown resources); warnings are things that are legal but probably
/// not what the author meant.
pub fn lint_content(content: &GameContent) -> LintReport {
    let mut linter = Linter {
        content,
        report: LintReport::default(),
    };

    linter.elements("intro", &content.intro, None);
    let starts_story = content
        .intro
        .iter()
        .flat_map(Element::options)
        .any(|o| o.events.contains(&GameEvent::StartCustomization));
    if !starts_story {
        linter.warn("intro: no option fires cyoaStart, the story cannot begin".to_string());
    }

    for (id, category) in content.custom.iter() {
        linter.elements(&format!("custom '{}'", id), &category.elements, None);
        if let (Some(max), Some(required)) = (category.max_select, category.required) {
            if max > 0 && required > max {
                linter.error(format!(
                    "custom '{}': requires {} selections but allows only {}",
                    id, required, max
                ));
            }
        }
    }

    for (id, resource) in content.resources.iter() {
        let ctx = format!("resource '{}'", id);
        linter.expression(&ctx, resource.max_value.as_ref());
        linter.expression(&ctx, resource.min_value.as_ref());
    }

    if content.scenes.is_empty() {
        linter.warn("scenes: no story nodes defined".to_string());
    }
    for (id, node) in content.scenes.iter() {
        linter.node(id, node);
    }

    if content.endings.is_empty() {
        linter.error("endings: no endings defined".to_string());
    } else if content
        .endings
        .values()
        .all(|e| e.condition.as_ref().is_some_and(|c| !c.is_empty()))
    {
        linter.warn("endings: every ending is conditional, the story may fail to end".to_string());
    }
    for (id, ending) in content.endings.iter() {
        let ctx = format!("ending '{}'", id);
        linter.expression(&ctx, ending.condition.as_ref());
        linter.elements(&ctx, &ending.elements, None);
    }

    linter.events("settings", &content.settings.events);

    linter.report
}

impl Linter<'_> {
    fn error(&mut self, message: String) {
        self.report.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.report.warnings.push(message);
    }

    fn node(&mut self, id: &str, node: &StoryNode) {
        let ctx = format!("scene '{}'", id);
        if !node.pages.contains_key(node.start_page_id()) {
            self.error(format!("{}: start page '{}' does not exist", ctx, node.start_page_id()));
        }
        if node.weight <= 0.0 {
            self.warn(format!("{}: weight {} can never be drawn", ctx, node.weight));
        }
        self.expression(&ctx, node.condition.as_ref());
        for (page_id, page) in node.pages.iter() {
            let page_ctx = format!("{} page '{}'", ctx, page_id);
            self.elements(&page_ctx, &page.elements, Some(node));
        }
    }

    fn elements(&mut self, ctx: &str, elements: &[Element], node: Option<&StoryNode>) {
        for option in elements.iter().flat_map(Element::options) {
            let option_ctx = match option.title.as_deref().or(option.id.as_deref()) {
                Some(name) => format!("{} option '{}'", ctx, name),
                None => format!("{} option", ctx),
            };
            self.option(&option_ctx, option, node);
        }
    }

    fn option(&mut self, ctx: &str, option: &OptionDef, node: Option<&StoryNode>) {
        self.expression(ctx, option.condition.as_ref());
        self.events(ctx, &option.events);
        for branch in option.branch.iter().flatten() {
            self.branch(ctx, branch, node);
        }
    }

    fn branch(&mut self, ctx: &str, branch: &Branch, node: Option<&StoryNode>) {
        self.expression(ctx, branch.condition.as_ref());
        if branch.weight <= 0.0 {
            self.warn(format!("{}: branch weight {} can never be drawn", ctx, branch.weight));
        }
        match &branch.target {
            BranchTarget::Page(page) => match node {
                Some(node) if node.pages.contains_key(page) => {}
                Some(_) => self.error(format!("{}: branch to missing page '{}'", ctx, page)),
                None => self.error(format!("{}: page branch outside a story node", ctx)),
            },
            BranchTarget::Ending(ending) if !self.content.endings.contains_key(ending) => {
                self.error(format!("{}: branch to missing ending '{}'", ctx, ending));
            }
            _ => {}
        }
    }

    fn events(&mut self, ctx: &str, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::SetValue(m) => {
                    if let MutationTarget::Resource(id) = &m.target {
                        if !self.content.resources.contains_key(id) {
                            self.error(format!("{}: setValue on unknown resource '{}'", ctx, id));
                            continue;
                        }
                    }
                    if !m.operation.applies_to(&m.target) {
                        self.error(format!(
                            "{}: operation '{}' is not valid for target '{}'",
                            ctx,
                            m.operation.as_str(),
                            m.target
                        ));
                    }
                    self.expression(ctx, Some(&m.value));
                    self.expression(ctx, m.condition.as_ref());
                }
                GameEvent::Unknown => self.warn(format!("{}: unknown event type ignored", ctx)),
                _ => {}
            }
        }
    }

    fn expression(&mut self, ctx: &str, expression: Option<&Expression>) {
        let Some(expression) = expression else {
            return;
        };
        for name in expr::identifiers(expression.as_str()) {
            if !self.content.resources.contains_key(&name) {
                self.warn(format!(
                    "{}: '{}' in `{}` is not a resource and reads as text",
                    ctx, name, expression
                ));
            }
        }
        for c in expr::unknown_characters(expression.as_str()) {
            self.warn(format!("{}: unexpected '{}' in `{}`", ctx, c, expression));
        }
    }
}
