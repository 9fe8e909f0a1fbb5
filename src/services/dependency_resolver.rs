use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::Stage;
use std::collections::{HashMap, HashSet};

/// Resolves stage prerequisites and detects circular dependencies
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

// Standalone helper for cycle detection (no self needed)
fn detect_cycle_util<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(neighbor) {
                if let Some(cycle_start) = path.iter().position(|&name| name == neighbor) {
                    path.drain(0..cycle_start);
                    path.push(neighbor);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

impl DependencyResolver {
    pub const fn new() -> Self {
        Self
    }

    /// Every prerequisite must name a known stage.
    pub fn validate_prerequisites(&self, stages: &[Stage]) -> HarnessResult<()> {
        let known: HashSet<&str> = stages.iter().map(Stage::name).collect();
        for stage in stages {
            for prereq in stage.prerequisites() {
                if !known.contains(prereq.as_str()) {
                    return Err(HarnessError::InvalidStage {
                        stage: stage.name().to_string(),
                        reason: format!("unknown prerequisite stage {prereq}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Find a prerequisite cycle, returned as a closed path (`a -> b -> a`).
    pub fn detect_cycle(&self, stages: &[Stage]) -> Option<Vec<String>> {
        let graph: HashMap<&str, Vec<&str>> = stages
            .iter()
            .map(|s| (s.name(), s.prerequisites().iter().map(String::as_str).collect()))
            .collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        // Declaration order keeps the reported cycle deterministic
        for stage in stages {
            if !visited.contains(stage.name())
                && detect_cycle_util(stage.name(), &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path.into_iter().map(String::from).collect());
            }
        }

        None
    }

    /// Stages a request for `target` would execute, prerequisites first.
    pub fn execution_order(&self, target: &str, stages: &[Stage]) -> HarnessResult<Vec<String>> {
        let by_name: HashMap<&str, &Stage> = stages.iter().map(|s| (s.name(), s)).collect();
        if !by_name.contains_key(target) {
            return Err(HarnessError::UnknownStage(target.to_string()));
        }

        let mut order = Vec::new();
        let mut visiting = Vec::new();
        visit(target, &by_name, &mut visiting, &mut order)?;
        Ok(order)
    }
}

// Depth-first post-order walk
fn visit(
    name: &str,
    by_name: &HashMap<&str, &Stage>,
    visiting: &mut Vec<String>,
    order: &mut Vec<String>,
) -> HarnessResult<()> {
    if order.iter().any(|done| done == name) {
        return Ok(());
    }
    if let Some(pos) = visiting.iter().position(|v| v == name) {
        let mut cycle = visiting[pos..].to_vec();
        cycle.push(name.to_string());
        return Err(HarnessError::DependencyCycle(cycle));
    }

    let stage = by_name
        .get(name)
        .ok_or_else(|| HarnessError::UnknownStage(name.to_string()))?;

    visiting.push(name.to_string());
    for prereq in stage.prerequisites() {
        visit(prereq, by_name, visiting, order)?;
    }
    visiting.pop();

    order.push(name.to_string());
    Ok(())
}
