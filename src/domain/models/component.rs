use serde::{Deserialize, Serialize};
use std::fmt;

/// How the supervisor treats a component once it has been spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    /// Runs until it is explicitly signaled to stop.
    Service,
    /// Runs to completion; starting it blocks until it exits.
    Application,
    /// Needs bespoke bring-up outside the generic supervisor.
    Special,
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Application => write!(f, "application"),
            Self::Special => write!(f, "special"),
        }
    }
}

/// Shutdown ordering: workers go down before the shared infrastructure
/// they talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownTier {
    Worker,
    Infrastructure,
}

/// Executable behind a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// Compiled from source by the build collaborator into the bin dir.
    Built { binary: String },
    /// Already installed; invoked by name.
    External { program: String },
}

/// Directory a component is spawned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingDir {
    BinDir,
    ExchangeRoot,
    PharosRoot,
    DpnServerRoot,
}

/// Where a component's stdout and stderr go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Inherit,
    Discard,
    /// File name relative to the log dir, truncated on each start.
    LogFile(String),
}

/// A named, buildable, startable unit of the pipeline.
///
/// Arguments may carry `{placeholder}` tokens that the supervisor expands
/// from its settings (`{exchange_root}`, `{integration_config}`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    name: String,
    kind: LifecycleKind,
    tier: ShutdownTier,
    program: Program,
    args: Vec<String>,
    working_dir: WorkingDir,
    output: OutputTarget,
}

impl Component {
    fn new(name: impl Into<String>, kind: LifecycleKind) -> Self {
        let name = name.into();
        Self {
            program: Program::Built {
                binary: name.clone(),
            },
            name,
            kind,
            tier: ShutdownTier::Worker,
            args: Vec::new(),
            working_dir: WorkingDir::BinDir,
            output: OutputTarget::Inherit,
        }
    }

    /// A long-running service built from source.
    pub fn service(name: impl Into<String>) -> Self {
        Self::new(name, LifecycleKind::Service)
    }

    /// A run-to-completion application built from source.
    pub fn application(name: impl Into<String>) -> Self {
        Self::new(name, LifecycleKind::Application)
    }

    /// A component the generic supervisor refuses to handle.
    pub fn special(name: impl Into<String>) -> Self {
        let mut component = Self::new(name, LifecycleKind::Special);
        component.program = Program::External {
            program: String::new(),
        };
        component
    }

    /// A pipeline worker: `<binary> -config=<integration config> [flags]`.
    pub fn worker(name: impl Into<String>, kind: LifecycleKind) -> Self {
        Self::new(name, kind).with_args(["-config={integration_config}"])
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run an installed program instead of a built binary.
    pub fn external(mut self, program: impl Into<String>) -> Self {
        self.program = Program::External {
            program: program.into(),
        };
        self
    }

    /// Run a built binary whose name differs from the component name.
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.program = Program::Built {
            binary: binary.into(),
        };
        self
    }

    pub const fn in_dir(mut self, dir: WorkingDir) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn log_to(mut self, file_name: impl Into<String>) -> Self {
        self.output = OutputTarget::LogFile(file_name.into());
        self
    }

    pub fn discard_output(mut self) -> Self {
        self.output = OutputTarget::Discard;
        self
    }

    /// Mark as shared infrastructure, stopped after every worker.
    pub const fn infrastructure(mut self) -> Self {
        self.tier = ShutdownTier::Infrastructure;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> LifecycleKind {
        self.kind
    }

    pub const fn tier(&self) -> ShutdownTier {
        self.tier
    }

    pub const fn program(&self) -> &Program {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub const fn working_dir(&self) -> WorkingDir {
        self.working_dir
    }

    pub const fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub const fn is_special(&self) -> bool {
        matches!(self.kind, LifecycleKind::Special)
    }

    /// Binary name when the component is compiled from source.
    pub fn binary_name(&self) -> Option<&str> {
        match &self.program {
            Program::Built { binary } => Some(binary),
            Program::External { .. } => None,
        }
    }
}
