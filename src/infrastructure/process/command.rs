//! Command construction shared by every process-spawning adapter

use super::settings::SupervisorSettings;
use crate::domain::models::{Component, OutputTarget, Program};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;

/// Why a run-to-completion command did not succeed
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error("failed to spawn: {0}")]
    Spawn(#[source] io::Error),

    #[error("exited with {0}")]
    Exit(ExitStatus),
}

/// Path or name of the executable behind a component.
pub fn program_path(component: &Component, settings: &SupervisorSettings) -> PathBuf {
    match component.program() {
        Program::Built { binary } => settings.bin_dir.join(binary),
        Program::External { program } => PathBuf::from(program),
    }
}

/// Open a log file in the log dir, truncating what a previous run left.
pub fn log_file(settings: &SupervisorSettings, file_name: &str) -> io::Result<File> {
    std::fs::create_dir_all(&settings.log_dir)?;
    File::create(settings.log_path(file_name))
}

fn output_stdio(target: &OutputTarget, settings: &SupervisorSettings) -> io::Result<(Stdio, Stdio)> {
    Ok(match target {
        OutputTarget::Inherit => (Stdio::inherit(), Stdio::inherit()),
        OutputTarget::Discard => (Stdio::null(), Stdio::null()),
        OutputTarget::LogFile(name) => {
            let file = log_file(settings, name)?;
            let err = file.try_clone()?;
            (Stdio::from(file), Stdio::from(err))
        }
    })
}

/// Command for a component, with expanded arguments, working directory,
/// shared environment and output redirection.
///
/// Children get their own process group so a terminal interrupt reaches
/// the harness only; the harness then stops them in order.
pub fn component_command(component: &Component, settings: &SupervisorSettings) -> io::Result<Command> {
    let (stdout, stderr) = output_stdio(component.output(), settings)?;

    let mut command = Command::new(program_path(component, settings));
    command
        .args(component.args().iter().map(|arg| settings.expand(arg)))
        .current_dir(settings.dir(component.working_dir()))
        .envs(&settings.env)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    #[cfg(unix)]
    command.process_group(0);

    Ok(command)
}

/// Command for an argv vector (`["rbenv", "exec", "rake", ...]`) run in `dir`.
///
/// The child is killed if the future awaiting it is dropped, so a
/// cancelled run does not leave it working against stopped services.
pub fn argv_command(argv: &[String], dir: &Path, settings: &SupervisorSettings) -> io::Result<Command> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

    let mut command = Command::new(program);
    command
        .args(args.iter().map(|arg| settings.expand(arg)))
        .current_dir(dir)
        .envs(&settings.env)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    Ok(command)
}

/// Run to completion; any non-zero exit is a failure.
pub async fn run_to_completion(command: &mut Command) -> Result<(), CommandFailure> {
    let status = command.status().await.map_err(CommandFailure::Spawn)?;
    if status.success() {
        Ok(())
    } else {
        Err(CommandFailure::Exit(status))
    }
}

/// Render an argv vector for log lines.
pub fn display_argv(argv: &[String]) -> String {
    argv.join(" ")
}
