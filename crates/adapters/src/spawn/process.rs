// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participants as forked processes

#![allow(unsafe_code)]

use super::{Entry, ExitStatus, SpawnError, Spawner, Termination, EXIT_PANIC, EXIT_PROTOCOL_FAILURE};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use sg_core::Role;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Forks one child per participant.
///
/// Anything an entry borrows must already live in memory shared with the
/// child (the barrier) or be fine as a private copy (the hooks). Spawn from a
/// single-threaded parent: only the forking thread survives in the child.
#[derive(Debug, Default)]
pub struct ProcessSpawner;

impl ProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

/// Run the entry in the child and leave without unwinding into the parent's
/// stack or running its destructors
fn run_child(role: Role, entry: Entry<'_>) -> ! {
    let code = match catch_unwind(AssertUnwindSafe(entry)) {
        Ok(Ok(report)) => {
            tracing::debug!(%role, stages = report.stages_completed, "child finished");
            0
        }
        Ok(Err(e)) => {
            tracing::error!(%role, error = %e, "child failed");
            EXIT_PROTOCOL_FAILURE
        }
        Err(_) => EXIT_PANIC,
    };
    // SAFETY: `_exit` is async-signal-safe and skips atexit handlers and
    // stdio flushing, so nothing inherited from the parent is torn down twice.
    unsafe { nix::libc::_exit(code) }
}

impl<'a> Spawner<'a> for ProcessSpawner {
    type Handle = Pid;

    fn spawn(&mut self, role: Role, entry: Entry<'a>) -> Result<Pid, SpawnError> {
        // SAFETY: the child only runs the entry and then leaves through
        // `libc::_exit`; it never returns into code that assumes the parent's
        // other threads exist.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                tracing::debug!(%role, pid = child.as_raw(), "forked");
                Ok(child)
            }
            Ok(ForkResult::Child) => run_child(role, entry),
            Err(source) => Err(SpawnError::Fork { role, source }),
        }
    }

    fn await_termination(&mut self, pid: Pid) -> Termination {
        loop {
            match waitpid(pid, None) {
                Ok(WaitStatus::Exited(_, 0)) => return Termination::success(None),
                Ok(WaitStatus::Exited(_, code)) => {
                    return Termination::failed(ExitStatus::Exited(code))
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    return Termination::failed(ExitStatus::Signaled(signal.as_str().to_string()))
                }
                // Stopped or continued: still alive
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(e) => return Termination::failed(ExitStatus::Failed(e.to_string())),
            }
        }
    }

    fn terminate(&mut self, pid: &Pid) {
        match kill(*pid, Signal::SIGKILL) {
            Ok(()) => tracing::debug!(pid = pid.as_raw(), "sent SIGKILL"),
            // Already exited but not yet reaped
            Err(Errno::ESRCH) => {}
            Err(e) => tracing::warn!(pid = pid.as_raw(), error = %e, "kill failed"),
        }
    }
}
