//! Running-process table
//!
//! One slot per known non-special component. A slot that is not
//! `Running` has no pid, so there is nothing that could be signaled.

use crate::domain::models::ShutdownTier;
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::process::Child;

/// A spawned service the supervisor still owns.
#[derive(Debug)]
pub struct TrackedProcess {
    pub pid: u32,
    pub tier: ShutdownTier,
    /// Start order, used to stop the latest-started first within a tier
    pub seq: u64,
    pub child: Option<Child>,
}

#[derive(Debug, Default)]
pub enum ProcessSlot {
    #[default]
    NotRunning,
    Running(TrackedProcess),
    /// An application that ran to completion; exit code when it had one
    Exited(Option<i32>),
}

impl ProcessSlot {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

#[derive(Debug, Default)]
pub struct RunningProcessTable {
    slots: HashMap<String, ProcessSlot>,
    next_seq: u64,
}

impl RunningProcessTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: names
                .into_iter()
                .map(|name| (name.into(), ProcessSlot::NotRunning))
                .collect(),
            next_seq: 0,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn slot(&self, name: &str) -> Option<&ProcessSlot> {
        self.slots.get(name)
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut ProcessSlot> {
        self.slots.get_mut(name)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(ProcessSlot::is_running)
    }

    /// Record a freshly spawned service.
    pub fn mark_running(&mut self, name: &str, pid: u32, tier: ShutdownTier, child: Option<Child>) {
        self.next_seq += 1;
        let tracked = TrackedProcess {
            pid,
            tier,
            seq: self.next_seq,
            child,
        };
        self.slots.insert(name.to_string(), ProcessSlot::Running(tracked));
    }

    pub fn mark_exited(&mut self, name: &str, code: Option<i32>) {
        self.slots.insert(name.to_string(), ProcessSlot::Exited(code));
    }

    /// Reset a slot and hand back whatever was tracked in it.
    pub fn take(&mut self, name: &str) -> Option<TrackedProcess> {
        let slot = self.slots.get_mut(name)?;
        match std::mem::take(slot) {
            ProcessSlot::Running(tracked) => Some(tracked),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Running components in shutdown order: workers before shared
    /// infrastructure, latest-started first within each tier.
    pub fn shutdown_order(&self) -> Vec<String> {
        let mut running: Vec<(&String, &TrackedProcess)> = self
            .slots
            .iter()
            .filter_map(|(name, slot)| match slot {
                ProcessSlot::Running(tracked) => Some((name, tracked)),
                _ => None,
            })
            .collect();
        running.sort_by_key(|(_, tracked)| (tracked.tier, Reverse(tracked.seq)));
        running.into_iter().map(|(name, _)| name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_start_not_running() {
        let table = RunningProcessTable::new(["apt_fetch", "nsq_service"]);
        assert!(table.contains("apt_fetch"));
        assert!(!table.is_running("apt_fetch"));
        assert!(!table.contains("dpn_cluster"));
    }

    #[test]
    fn test_take_resets_slot() {
        let mut table = RunningProcessTable::new(["apt_fetch"]);
        table.mark_running("apt_fetch", 4242, ShutdownTier::Worker, None);
        assert!(table.is_running("apt_fetch"));

        let tracked = table.take("apt_fetch").unwrap();
        assert_eq!(tracked.pid, 4242);
        assert!(!table.is_running("apt_fetch"));
        assert!(table.take("apt_fetch").is_none());
    }

    #[test]
    fn test_take_keeps_exit_status() {
        let mut table = RunningProcessTable::new(["apt_queue"]);
        table.mark_exited("apt_queue", Some(0));
        assert!(table.take("apt_queue").is_none());
        assert!(matches!(table.slot("apt_queue"), Some(ProcessSlot::Exited(Some(0)))));
    }

    #[test]
    fn test_shutdown_order_workers_first() {
        let mut table =
            RunningProcessTable::new(["pharos", "nsq_service", "apt_fetch", "apt_store"]);
        table.mark_running("pharos", 1, ShutdownTier::Infrastructure, None);
        table.mark_running("nsq_service", 2, ShutdownTier::Infrastructure, None);
        table.mark_running("apt_fetch", 3, ShutdownTier::Worker, None);
        table.mark_running("apt_store", 4, ShutdownTier::Worker, None);

        assert_eq!(
            table.shutdown_order(),
            ["apt_store", "apt_fetch", "nsq_service", "pharos"]
        );
    }
}
