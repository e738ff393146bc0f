use serde::Serialize;

use crate::schema::event::Mutation;
use crate::schema::value::Value;

/// A committed mutation together with the value it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedMutation {
    pub mutation: Mutation,
    pub resolved: Value,
}

/// What happened during one story node.
///
/// `summaries`, `choices` and `pages` are parallel by page index: page `i`
/// was summarized by `summaries[i]`, left through `choices[i]` and caused
/// the mutations in `pages[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub title: String,
    pub summaries: Vec<String>,
    pub choices: Vec<String>,
    pub pages: Vec<Vec<LoggedMutation>>,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            title: String::new(),
            summaries: Vec::new(),
            choices: Vec::new(),
            pages: vec![Vec::new()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    current: LogEntry,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording a story node.
    pub fn begin(&mut self, title: &str, summary: &str) {
        self.current.title = title.to_string();
        self.current.summaries.push(summary.to_string());
    }

    /// The node moved on to another page.
    pub fn push_page(&mut self, summary: &str) {
        self.current.summaries.push(summary.to_string());
        self.current.pages.push(Vec::new());
    }

    pub fn record_choice(&mut self, label: &str) {
        self.current.choices.push(label.to_string());
    }

    pub fn record_mutation(&mut self, mutation: &Mutation, resolved: Value) {
        let logged = LoggedMutation {
            mutation: mutation.clone(),
            resolved,
        };
        match self.current.pages.last_mut() {
            Some(bucket) => bucket.push(logged),
            None => self.current.pages.push(vec![logged]),
        }
    }

    /// Finish the open entry and start a blank one.
    pub fn close(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.entries.push(finished);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn current(&self) -> &LogEntry {
        &self.current
    }
}
