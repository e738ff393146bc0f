//! WASM bindings for choice-engine — drives a story from a web page.
//!
//! Content goes in as the six JSON documents; everything coming back out is
//! a JSON string the page renders itself.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use choice_engine::core::lint::lint_content;
use choice_engine::core::session::Session;
use choice_engine::schema::{DocumentKind, GameContent};

// ---------------------------------------------------------------------------
// Embedded demo story — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const CARAVAN_INTRO: &str = include_str!("../../demos/caravan/intro.json");
    pub const CARAVAN_CUSTOM: &str = include_str!("../../demos/caravan/custom.json");
    pub const CARAVAN_RESOURCE: &str = include_str!("../../demos/caravan/resource.json");
    pub const CARAVAN_SCENES: &str = include_str!("../../demos/caravan/scenes.json");
    pub const CARAVAN_ENDINGS: &str = include_str!("../../demos/caravan/endings.json");
    pub const CARAVAN_SETTING: &str = include_str!("../../demos/caravan/setting.json");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(Serialize)]
struct LintInfo {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn parse_content(documents: [(DocumentKind, &str); 6]) -> Result<GameContent, JsError> {
    let mut content = GameContent::default();
    for (kind, text) in documents {
        if text.trim().is_empty() {
            continue;
        }
        content
            .insert_json(kind, text)
            .map_err(|e| JsError::new(&format!("Invalid {kind} document: {e}")))?;
    }
    Ok(content)
}

// ---------------------------------------------------------------------------
// ChoiceSession — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct ChoiceSession {
    session: Session,
}

#[wasm_bindgen]
impl ChoiceSession {
    /// Create a session from the six content documents. Empty strings stand
    /// for absent documents.
    #[wasm_bindgen(constructor)]
    pub fn new(
        intro: &str,
        custom: &str,
        resource: &str,
        scenes: &str,
        endings: &str,
        setting: &str,
        seed: u64,
    ) -> Result<ChoiceSession, JsError> {
        let content = parse_content([
            (DocumentKind::Intro, intro),
            (DocumentKind::Custom, custom),
            (DocumentKind::Resources, resource),
            (DocumentKind::Scenes, scenes),
            (DocumentKind::Endings, endings),
            (DocumentKind::Settings, setting),
        ])?;
        let session = Session::builder()
            .seed(seed)
            .content(content)
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;
        Ok(ChoiceSession { session })
    }

    /// The bundled caravan story.
    pub fn demo(seed: u64) -> Result<ChoiceSession, JsError> {
        Self::new(
            data::CARAVAN_INTRO,
            data::CARAVAN_CUSTOM,
            data::CARAVAN_RESOURCE,
            data::CARAVAN_SCENES,
            data::CARAVAN_ENDINGS,
            data::CARAVAN_SETTING,
            seed,
        )
    }

    /// Show the intro. Call `take_blocks` afterwards.
    pub fn start(&mut self) {
        self.session.start();
    }

    /// Pick an option by id.
    pub fn activate(&mut self, option_id: &str) -> Result<(), JsError> {
        self.session
            .activate(option_id)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Evaluate an expression against the preview. Returns the value as JSON.
    pub fn evaluate(&mut self, expression: &str) -> Result<String, JsError> {
        to_json(&self.session.evaluate(expression))
    }

    /// Render blocks appended since the last call, as a JSON array.
    pub fn take_blocks(&mut self) -> Result<String, JsError> {
        to_json(&self.session.take_blocks())
    }

    /// Every option with its visibility, locks and toggle state.
    pub fn options(&self) -> Result<String, JsError> {
        let options: Vec<_> = self.session.options().collect();
        to_json(&options)
    }

    /// Effect preview for one option, or `null` for an unknown id.
    pub fn option_effects(&mut self, option_id: &str) -> Result<String, JsError> {
        to_json(&self.session.option_effects(option_id))
    }

    pub fn state(&self) -> Result<String, JsError> {
        to_json(self.session.state())
    }

    pub fn status(&mut self) -> Result<String, JsError> {
        to_json(&self.session.status())
    }

    pub fn phase(&self) -> Result<String, JsError> {
        to_json(&self.session.phase())
    }

    pub fn round(&self) -> u32 {
        self.session.round()
    }

    /// The recap as JSON, or `null` before the summary is reached.
    pub fn summary(&self) -> Result<String, JsError> {
        to_json(&self.session.summary())
    }

    /// The recap as plain text, empty before the summary is reached.
    pub fn summary_text(&self) -> String {
        self.session
            .summary()
            .map(|s| s.to_text())
            .unwrap_or_default()
    }

    /// Lint this session's content. Returns `{errors, warnings}`.
    pub fn lint(&self) -> Result<String, JsError> {
        let report = lint_content(self.session.content());
        to_json(&LintInfo {
            errors: report.errors,
            warnings: report.warnings,
        })
    }
}
