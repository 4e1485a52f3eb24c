// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant spawning
//!
//! A [`Spawner`] starts one participant per call and later reaps it. The host
//! never cares whether a participant is a thread or a process; only spawning
//! and termination differ between execution models.

mod fault;
mod process;
mod thread;

pub use fault::{FaultLayer, FaultySpawner, RoleHandle, SpawnCall, SpawnLog};
pub use process::ProcessSpawner;
pub use thread::ThreadSpawner;

use serde::Serialize;
use sg_core::{ParticipantReport, ProtocolError, Role};
use std::fmt;
use thiserror::Error;

/// Body of a participant, run on the new thread or in the forked child
pub type Entry<'a> = Box<dyn FnOnce() -> Result<ParticipantReport, ProtocolError> + Send + 'a>;

/// Exit code of a child whose stage loop failed
pub const EXIT_PROTOCOL_FAILURE: i32 = 1;
/// Exit code of a child whose stage loop panicked
pub const EXIT_PANIC: i32 = 101;

/// A participant could not be created
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn thread for {role}: {source}")]
    Thread {
        role: Role,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fork {role}: {source}")]
    Fork {
        role: Role,
        #[source]
        source: nix::Error,
    },
    #[error("spawn of {role} refused after {allowed} spawns (fault injection)")]
    Injected { role: Role, allowed: usize },
}

impl SpawnError {
    pub fn role(&self) -> Role {
        match self {
            SpawnError::Thread { role, .. }
            | SpawnError::Fork { role, .. }
            | SpawnError::Injected { role, .. } => *role,
        }
    }
}

/// How a participant ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ExitStatus {
    Success,
    /// Process exited with a non-zero code
    Exited(i32),
    /// Process was killed by a signal
    Signaled(String),
    /// Thread returned an error or panicked
    Failed(String),
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Success => write!(f, "success"),
            ExitStatus::Exited(code) => write!(f, "exited with code {}", code),
            ExitStatus::Signaled(signal) => write!(f, "killed by {}", signal),
            ExitStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Result of awaiting one participant
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Termination {
    pub status: ExitStatus,
    /// Only in-process participants can hand their report back
    pub report: Option<ParticipantReport>,
}

impl Termination {
    pub fn success(report: Option<ParticipantReport>) -> Self {
        Self {
            status: ExitStatus::Success,
            report,
        }
    }

    pub fn failed(status: ExitStatus) -> Self {
        Self {
            status,
            report: None,
        }
    }
}

/// Creates and reaps participants.
///
/// `'a` bounds what an entry may borrow, typically the barrier and the hooks.
pub trait Spawner<'a> {
    type Handle;

    /// Start `entry` as a new participant
    fn spawn(&mut self, role: Role, entry: Entry<'a>) -> Result<Self::Handle, SpawnError>;

    /// Block until the participant has terminated
    fn await_termination(&mut self, handle: Self::Handle) -> Termination;

    /// Stop a participant that can no longer make progress.
    ///
    /// Best effort: the caller still awaits the handle afterwards.
    fn terminate(&mut self, handle: &Self::Handle);
}

/// Wraps a spawner in another, like middleware
pub trait SpawnLayer {
    fn layer<'a, S: Spawner<'a>>(&self, inner: S) -> impl Spawner<'a>;
}

impl SpawnLayer for () {
    fn layer<'a, S: Spawner<'a>>(&self, inner: S) -> impl Spawner<'a> {
        inner
    }
}

/// `(A, B)` applies `A` first, so `B` ends up outermost
impl<A: SpawnLayer, B: SpawnLayer> SpawnLayer for (A, B) {
    fn layer<'a, S: Spawner<'a>>(&self, inner: S) -> impl Spawner<'a> {
        self.1.layer(self.0.layer(inner))
    }
}

impl<L: SpawnLayer> SpawnLayer for &L {
    fn layer<'a, S: Spawner<'a>>(&self, inner: S) -> impl Spawner<'a> {
        (**self).layer(inner)
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
