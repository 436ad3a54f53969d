//! Load status reporting.
//!
//! Every handler, event and command load emits one status line in the form
//! `"<Category> : <name> | Status: <glyph> <Loaded|Loading|Error>"`. The glyphs
//! come from configuration; [`StatusGlyphs::default`] holds the stock set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Lifecycle state reported for a loadable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStatus {
    Loading,
    Success,
    Error,
}

impl LogStatus {
    /// Label printed after the glyph.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Success => "Loaded",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Glyphs shown next to each status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusGlyphs {
    pub success: String,
    pub loading: String,
    pub error: String,
}

impl Default for StatusGlyphs {
    fn default() -> Self {
        Self {
            success: "✅".to_string(),
            loading: "⏳".to_string(),
            error: "❌".to_string(),
        }
    }
}

impl StatusGlyphs {
    pub fn glyph(&self, status: LogStatus) -> &str {
        match status {
            LogStatus::Loading => &self.loading,
            LogStatus::Success => &self.success,
            LogStatus::Error => &self.error,
        }
    }

    /// Renders one status line.
    pub fn render(&self, category: &str, name: &str, status: LogStatus) -> String {
        format!(
            "{category} : {name} | Status: {} {}",
            self.glyph(status),
            status.label()
        )
    }
}

/// Outcome of a batch load.
///
/// Loads are best-effort: a failing item is recorded and the batch continues.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names of the items that loaded.
    pub loaded: Vec<String>,
    /// Origin and error of every item that failed.
    pub failures: Vec<(String, LoadError)>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Appends another report.
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded.extend(other.loaded);
        self.failures.extend(other.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_status_line() {
        let glyphs = StatusGlyphs::default();
        assert_eq!(
            glyphs.render("Handler", "event", LogStatus::Success),
            "Handler : event | Status: ✅ Loaded"
        );
        assert_eq!(
            glyphs.render("Event", "ready", LogStatus::Loading),
            "Event : ready | Status: ⏳ Loading"
        );
        assert_eq!(
            glyphs.render("Command", "ping", LogStatus::Error),
            "Command : ping | Status: ❌ Error"
        );
    }
}
