//! The content bundle and its loaders.

use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use super::custom::Category;
use super::element::Element;
use super::ordered::OrderedMap;
use super::resource::ResourceDef;
use super::settings::Settings;
use super::story::{Ending, StoryNode};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The six documents a story is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Intro,
    Custom,
    Resources,
    Scenes,
    Endings,
    Settings,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        Self::Intro,
        Self::Custom,
        Self::Resources,
        Self::Scenes,
        Self::Endings,
        Self::Settings,
    ];

    /// File name without extension, e.g. `scenes` for `scenes.json`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Custom => "custom",
            Self::Resources => "resource",
            Self::Scenes => "scenes",
            Self::Endings => "endings",
            Self::Settings => "setting",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Serialization format of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Ron,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ron => "ron",
        }
    }

    fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, ContentError> {
        Ok(match self {
            Self::Json => serde_json::from_str(text)?,
            Self::Ron => ron::from_str(text)?,
        })
    }
}

/// Everything a story is made of. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct GameContent {
    pub intro: Vec<Element>,
    pub custom: OrderedMap<Category>,
    pub resources: OrderedMap<ResourceDef>,
    pub scenes: OrderedMap<StoryNode>,
    pub endings: OrderedMap<Ending>,
    pub settings: Settings,
}

impl GameContent {
    /// Load every document from a directory. Each document is read from
    /// `<stem>.json`, or `<stem>.ron` when no JSON file exists. A missing
    /// document is left empty.
    pub fn load_dir(dir: &Path) -> Result<GameContent, ContentError> {
        let mut content = GameContent::default();
        for kind in DocumentKind::ALL {
            let mut found = false;
            for format in [Format::Json, Format::Ron] {
                let path = dir.join(format!("{}.{}", kind.file_stem(), format.extension()));
                if path.is_file() {
                    let text = std::fs::read_to_string(&path)?;
                    content.insert(kind, format, &text)?;
                    debug!(document = %kind, path = %path.display(), "content_document_loaded");
                    found = true;
                    break;
                }
            }
            if !found {
                warn!(document = %kind, dir = %dir.display(), "content_document_missing");
            }
        }
        Ok(content)
    }

    /// Parse one document from text, replacing what was loaded before.
    pub fn insert(&mut self, kind: DocumentKind, format: Format, text: &str) -> Result<(), ContentError> {
        match kind {
            DocumentKind::Intro => self.intro = format.parse(text)?,
            DocumentKind::Custom => self.custom = format.parse(text)?,
            DocumentKind::Resources => self.resources = format.parse(text)?,
            DocumentKind::Scenes => self.scenes = format.parse(text)?,
            DocumentKind::Endings => self.endings = format.parse(text)?,
            DocumentKind::Settings => self.settings = format.parse(text)?,
        }
        Ok(())
    }

    pub fn insert_json(&mut self, kind: DocumentKind, text: &str) -> Result<(), ContentError> {
        self.insert(kind, Format::Json, text)
    }

    pub fn insert_ron(&mut self, kind: DocumentKind, text: &str) -> Result<(), ContentError> {
        self.insert(kind, Format::Ron, text)
    }

    /// Builder-style variant of [`insert_json`](Self::insert_json).
    pub fn with_json(mut self, kind: DocumentKind, text: &str) -> Result<Self, ContentError> {
        self.insert_json(kind, text)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::value::Value;

    #[test]
    fn insert_json_documents() {
        let content = GameContent::default()
            .with_json(
                DocumentKind::Resources,
                r#"{"gold": {"name": "Gold", "value": 3}, "hp": {"name": "HP", "value": 10}}"#,
            )
            .unwrap()
            .with_json(DocumentKind::Settings, r#"{"maxRound": 3}"#)
            .unwrap();
        assert_eq!(content.resources.keys().collect::<Vec<_>>(), vec!["gold", "hp"]);
        assert_eq!(content.settings.max_round, 3);
        assert!(content.scenes.is_empty());
    }

    #[test]
    fn insert_ron_resources() {
        let mut content = GameContent::default();
        content
            .insert_ron(
                DocumentKind::Resources,
                r#"{"gold": (name: "Gold", value: 3, show: true), "luck": (name: "Luck", value: 1)}"#,
            )
            .unwrap();
        let gold = content.resources.get("gold").unwrap();
        assert_eq!(gold.value, Value::Number(3.0));
        assert!(gold.show);
        assert_eq!(content.resources.keys().collect::<Vec<_>>(), vec!["gold", "luck"]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let mut content = GameContent::default();
        let err = content.insert_json(DocumentKind::Scenes, "{not json").unwrap_err();
        assert!(matches!(err, ContentError::Json(_)));
    }

    #[test]
    fn file_stems_match_content_layout() {
        let stems: Vec<_> = DocumentKind::ALL.iter().map(|k| k.file_stem()).collect();
        assert_eq!(stems, vec!["intro", "custom", "resource", "scenes", "endings", "setting"]);
    }
}
