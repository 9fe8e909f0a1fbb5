pub mod component;
pub mod config;
pub mod readiness;
pub mod stage;

pub use component::{Component, LifecycleKind, OutputTarget, Program, ShutdownTier, WorkingDir};
pub use config::{
    BackendConfig, ClusterConfig, Config, LoggingConfig, PathsConfig, ProcessConfig, RunnerConfig,
    TimingConfig, ToolchainConfig,
};
pub use readiness::ReadinessCondition;
pub use stage::{Check, Stage, StageBuilder, StageState, Step};
