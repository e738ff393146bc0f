use serde::{Deserialize, Serialize};

use super::event::GameEvent;

/// Global story settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Story nodes entered before the ending is forced. 0 is unlimited.
    #[serde(default)]
    pub max_round: u32,
    /// Events run on every transition to the next story node.
    #[serde(default)]
    pub events: Vec<GameEvent>,
}
