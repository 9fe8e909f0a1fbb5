//! Pass/fail bookkeeping for a harness run.
//!
//! Outcomes are kept in insertion order so the rendered report reads in
//! the order checks actually ran, prerequisites first.

use serde::{Deserialize, Serialize};

/// Width of the name column in [`ResultReport::render`].
const NAME_WIDTH: usize = 30;

/// One recorded check outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub name: String,
    pub passed: bool,
}

/// Insertion-ordered map from check name to outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultReport {
    entries: Vec<ResultEntry>,
}

impl ResultReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome; recording the same name again overwrites in place.
    pub fn record(&mut self, name: impl Into<String>, passed: bool) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.passed = passed;
        } else {
            self.entries.push(ResultEntry { name, passed });
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.passed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True when nothing failed; vacuously true for an empty report.
    pub fn all_passed(&self) -> bool {
        self.entries.iter().all(|e| e.passed)
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two-column `name: PASS|FAIL` table in insertion order.
    pub fn render(&self) -> String {
        let mut out = String::from("\n---Results---\n");
        for entry in &self.entries {
            let verdict = if entry.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!("{:<NAME_WIDTH$}: {verdict}\n", entry.name));
        }
        out
    }
}
