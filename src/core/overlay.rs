use crate::schema::event::{GameEvent, Mutation, MutationTarget};

/// A pending mutation contributed by an active toggle option.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub origin: String,
    pub mutation: Mutation,
}

/// Mutations from active toggles, replayed over the committed state in
/// insertion order to produce the preview state.
#[derive(Debug, Clone, Default)]
pub struct ToggleOverlay {
    entries: Vec<OverlayEntry>,
}

impl ToggleOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every `setValue` event of `origin`. Other events are ignored.
    pub fn activate(&mut self, origin: &str, events: &[GameEvent]) {
        for mutation in events.iter().filter_map(GameEvent::mutation) {
            self.entries.push(OverlayEntry {
                origin: origin.to_string(),
                mutation: mutation.clone(),
            });
        }
    }

    /// Remove every entry contributed by `origin`. Returns how many went.
    pub fn deactivate(&mut self, origin: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.origin != origin);
        before - self.entries.len()
    }

    /// Drop entries for a target whose preview has just been committed.
    pub fn discard_target(&mut self, target: &MutationTarget) {
        self.entries.retain(|e| &e.mutation.target != target);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
