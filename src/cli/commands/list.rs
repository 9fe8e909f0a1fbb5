use crate::application::StageRegistry;
use crate::cli::output::TableFormatter;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct StageListing<'a> {
    name: &'a str,
    description: &'a str,
    prerequisites: &'a [String],
    checks: Vec<&'a str>,
}

/// Print every registered stage.
pub fn execute(registry: &StageRegistry, json: bool) -> Result<()> {
    if json {
        let listing: Vec<StageListing<'_>> = registry
            .stages()
            .iter()
            .map(|stage| StageListing {
                name: stage.name(),
                description: stage.description(),
                prerequisites: stage.prerequisites(),
                checks: stage.check_names().collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!("{}", TableFormatter::new().format_stages(registry.stages()));
    }
    Ok(())
}

/// Usage line followed by the stage table.
pub fn usage(usage_line: &str, registry: &StageRegistry) -> String {
    format!(
        "{usage_line}\n\nStages:\n{}",
        TableFormatter::with_config(false, None).format_stages(registry.stages())
    )
}
