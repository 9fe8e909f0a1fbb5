//! Termination signals for tracked pids

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Send SIGTERM to `pid`.
///
/// Returns `Ok(false)` when there was nothing to signal: pid 0 (which would
/// hit the whole process group) or a process that has already gone away.
pub fn terminate(pid: u32) -> Result<bool, Errno> {
    let Ok(raw) = i32::try_from(pid) else {
        return Err(Errno::EINVAL);
    };
    if raw == 0 {
        return Ok(false);
    }

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e),
    }
}
