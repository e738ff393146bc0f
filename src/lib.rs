//! Choice Engine — a data-driven, choice-based narrative game engine.
//!
//! Story content (resources, customization categories, story nodes,
//! endings and settings) is authored as JSON or RON documents. The engine
//! evaluates condition expressions against live game state, keeps a
//! committed and a preview layer of that state, picks story nodes, branches
//! and endings by priority and weighted random draws, and records a log
//! from which the end-of-game recap is built.

pub mod core;
pub mod schema;
