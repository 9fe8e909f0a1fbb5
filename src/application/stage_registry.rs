//! Lookup table of components and stages
//!
//! Stages are invoked by name from the command line; the registry is the
//! explicit mapping from that name to a validated stage definition.

use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{Component, Stage};
use crate::services::DependencyResolver;
use std::collections::HashSet;

/// Validated set of components and the stages that use them
#[derive(Debug, Clone)]
pub struct StageRegistry {
    components: Vec<Component>,
    stages: Vec<Stage>,
}

impl StageRegistry {
    /// Validate and build a registry.
    ///
    /// Rejects duplicate names, unknown prerequisites or components,
    /// unbuildable build-list entries, and prerequisite cycles.
    pub fn new(components: Vec<Component>, stages: Vec<Stage>) -> HarnessResult<Self> {
        let mut seen = HashSet::new();
        for component in &components {
            if !seen.insert(component.name()) {
                return Err(HarnessError::invalid_operation(
                    component.name(),
                    "component registered twice",
                ));
            }
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage.name()) {
                return Err(HarnessError::InvalidStage {
                    stage: stage.name().to_string(),
                    reason: "stage registered twice".to_string(),
                });
            }
        }

        let registry = Self { components, stages };

        for stage in &registry.stages {
            for name in stage.build_list() {
                let component = registry.component(name)?;
                if component.binary_name().is_none() {
                    return Err(HarnessError::InvalidStage {
                        stage: stage.name().to_string(),
                        reason: format!("component {name} is not built from source"),
                    });
                }
            }
            for name in stage.started_components() {
                registry.component(name)?;
            }
        }

        let resolver = DependencyResolver::new();
        resolver.validate_prerequisites(&registry.stages)?;
        if let Some(cycle) = resolver.detect_cycle(&registry.stages) {
            return Err(HarnessError::DependencyCycle(cycle));
        }

        Ok(registry)
    }

    pub fn component(&self, name: &str) -> HarnessResult<&Component> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| HarnessError::UnknownComponent(name.to_string()))
    }

    pub fn stage(&self, name: &str) -> HarnessResult<&Stage> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| HarnessError::UnknownStage(name.to_string()))
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(Stage::name)
    }

    /// Stages a request for `name` would execute, prerequisites first.
    pub fn execution_order(&self, name: &str) -> HarnessResult<Vec<String>> {
        DependencyResolver::new().execution_order(name, &self.stages)
    }
}
