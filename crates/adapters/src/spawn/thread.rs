// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participants as scoped threads

use super::{Entry, ExitStatus, SpawnError, Spawner, Termination};
use sg_core::{ParticipantReport, ProtocolError, Role};
use std::thread::{Builder, Scope, ScopedJoinHandle};

/// Spawns participants as threads of a [`std::thread::scope`].
///
/// The scope guarantees every participant is joined before anything it
/// borrows, the barrier included, can be dropped.
pub struct ThreadSpawner<'scope, 'env> {
    scope: &'scope Scope<'scope, 'env>,
}

impl<'scope, 'env> ThreadSpawner<'scope, 'env> {
    pub fn new(scope: &'scope Scope<'scope, 'env>) -> Self {
        Self { scope }
    }
}

fn thread_name(role: Role) -> String {
    match role {
        Role::Coordinator => "sg-coordinator".to_string(),
        Role::Runner(id) => format!("sg-runner-{}", id),
    }
}

impl<'scope, 'env> Spawner<'scope> for ThreadSpawner<'scope, 'env> {
    type Handle = ScopedJoinHandle<'scope, Result<ParticipantReport, ProtocolError>>;

    fn spawn(&mut self, role: Role, entry: Entry<'scope>) -> Result<Self::Handle, SpawnError> {
        Builder::new()
            .name(thread_name(role))
            .spawn_scoped(self.scope, entry)
            .map_err(|source| SpawnError::Thread { role, source })
    }

    fn await_termination(&mut self, handle: Self::Handle) -> Termination {
        match handle.join() {
            Ok(Ok(report)) => Termination::success(Some(report)),
            Ok(Err(e)) => Termination::failed(ExitStatus::Failed(e.to_string())),
            Err(_) => Termination::failed(ExitStatus::Failed("panicked".to_string())),
        }
    }

    fn terminate(&mut self, handle: &Self::Handle) {
        // Threads cannot be killed; they unwind through the aborted barrier
        tracing::debug!(
            thread = handle.thread().name().unwrap_or("unnamed"),
            "waiting for thread to unwind"
        );
    }
}
