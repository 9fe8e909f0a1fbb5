//! Process management infrastructure
//!
//! - `settings`: configuration resolved once for every spawning adapter
//! - `command`: command construction and run-to-completion helpers
//! - `table`: one running/not-running slot per component
//! - `signal`: SIGTERM delivery that tolerates vanished processes
//! - `supervisor`: the [`ProcessSupervisor`](crate::domain::ports::ProcessSupervisor) for real OS processes

pub mod command;
pub mod settings;
pub mod signal;
pub mod supervisor;
pub mod table;

pub use command::CommandFailure;
pub use settings::SupervisorSettings;
pub use supervisor::OsProcessSupervisor;
pub use table::{ProcessSlot, RunningProcessTable, TrackedProcess};
