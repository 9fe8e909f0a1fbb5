//! Table output formatting for CLI commands
//!
//! Stage listings, execution plans and stage states using comfy-table.

use crate::domain::models::{Stage, StageState};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Name, description and prerequisites of every stage
    pub fn format_stages(&self, stages: &[Stage]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Requires").add_attribute(Attribute::Bold),
        ]);

        for stage in stages {
            let requires = if stage.prerequisites().is_empty() {
                "-".to_string()
            } else {
                stage.prerequisites().join(", ")
            };
            table.add_row(vec![
                Cell::new(stage.name()),
                Cell::new(stage.description()),
                Cell::new(requires),
            ]);
        }

        table.to_string()
    }

    /// Stages a run would execute, in order
    pub fn format_plan(&self, order: &[String]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Stage").add_attribute(Attribute::Bold),
        ]);
        for (index, name) in order.iter().enumerate() {
            table.add_row(vec![Cell::new(index + 1), Cell::new(name)]);
        }
        table.to_string()
    }

    /// Final state of every stage a run touched
    pub fn format_states(&self, states: &[(String, StageState)]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
        ]);
        for (name, state) in states {
            let cell = if self.use_colors {
                Cell::new(state.to_string()).fg(state_color(*state))
            } else {
                Cell::new(state.to_string())
            };
            table.add_row(vec![Cell::new(name), cell]);
        }
        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

const fn state_color(state: StageState) -> Color {
    match state {
        StageState::Passed => Color::Green,
        StageState::Failed | StageState::Aborted => Color::Red,
        StageState::Skipped => Color::Yellow,
        StageState::Pending | StageState::Running => Color::Grey,
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Check;

    #[test]
    fn test_format_stages_lists_prerequisites() {
        let stages = vec![
            Stage::builder("apt_bucket_reader")
                .describe("Test the bucket reader")
                .verify(Check::post_test("apt_bucket_reader_test", "apt_bucket_reader_post_test.go"))
                .finish()
                .unwrap(),
            Stage::builder("apt_ingest")
                .describe("Test ingest")
                .requires("apt_bucket_reader")
                .verify(Check::post_test("apt_ingest_test", "apt_ingest_post_test.go"))
                .finish()
                .unwrap(),
        ];
        let output = TableFormatter::with_config(false, Some(120)).format_stages(&stages);
        assert!(output.contains("apt_ingest"));
        assert!(output.contains("Test the bucket reader"));
        assert!(output.lines().any(|l| l.contains("apt_ingest") && l.contains("apt_bucket_reader")));
    }

    #[test]
    fn test_format_plan_numbers_stages() {
        let order = vec!["apt_bucket_reader".to_string(), "apt_ingest".to_string()];
        let output = TableFormatter::with_config(false, None).format_plan(&order);
        assert!(output.lines().any(|l| l.contains('2') && l.contains("apt_ingest")));
    }

    #[test]
    fn test_format_states_without_color() {
        let states = vec![("apt_ingest".to_string(), StageState::Skipped)];
        let output = TableFormatter::with_config(false, None).format_states(&states);
        assert!(output.contains("skipped"));
    }
}
