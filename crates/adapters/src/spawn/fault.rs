// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn fault injection and call recording
//!
//! Used for failure drills: let a fixed number of spawns through, refuse the
//! next, and record what the host did about it.

use super::{Entry, ExitStatus, SpawnError, SpawnLayer, Spawner, Termination};
use sg_core::Role;
use std::sync::{Arc, Mutex};

/// Recorded spawner call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnCall {
    Spawned(Role),
    Refused(Role),
    Terminated(Role),
    Awaited(Role, ExitStatus),
}

/// Shared log of spawner calls
#[derive(Clone, Debug, Default)]
pub struct SpawnLog {
    calls: Arc<Mutex<Vec<SpawnCall>>>,
}

impl SpawnLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: SpawnCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SpawnCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Roles that were spawned successfully
    pub fn spawned(&self) -> Vec<Role> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SpawnCall::Spawned(role) => Some(role),
                _ => None,
            })
            .collect()
    }

    /// Roles that were awaited, in order
    pub fn awaited(&self) -> Vec<Role> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SpawnCall::Awaited(role, _) => Some(role),
                _ => None,
            })
            .collect()
    }
}

/// Layer that refuses spawns after a budget and records every call
#[derive(Clone, Debug, Default)]
pub struct FaultLayer {
    allowed: Option<usize>,
    log: SpawnLog,
}

impl FaultLayer {
    /// Record calls without refusing anything
    pub fn record_only() -> Self {
        Self::default()
    }

    /// Let `allowed` spawns through, refuse the rest
    pub fn fail_after(allowed: usize) -> Self {
        Self {
            allowed: Some(allowed),
            log: SpawnLog::new(),
        }
    }

    pub fn log(&self) -> &SpawnLog {
        &self.log
    }
}

impl SpawnLayer for FaultLayer {
    fn layer<'a, S: Spawner<'a>>(&self, inner: S) -> impl Spawner<'a> {
        FaultySpawner {
            inner,
            allowed: self.allowed,
            spawned: 0,
            log: self.log.clone(),
        }
    }
}

/// Handle tagged with the role it was spawned for
pub struct RoleHandle<H> {
    role: Role,
    inner: H,
}

/// Spawner wrapper produced by [`FaultLayer`]
pub struct FaultySpawner<S> {
    inner: S,
    allowed: Option<usize>,
    spawned: usize,
    log: SpawnLog,
}

impl<'a, S: Spawner<'a>> Spawner<'a> for FaultySpawner<S> {
    type Handle = RoleHandle<S::Handle>;

    fn spawn(&mut self, role: Role, entry: Entry<'a>) -> Result<Self::Handle, SpawnError> {
        if let Some(allowed) = self.allowed {
            if self.spawned >= allowed {
                self.log.push(SpawnCall::Refused(role));
                return Err(SpawnError::Injected { role, allowed });
            }
        }

        let inner = self.inner.spawn(role, entry)?;
        self.spawned += 1;
        self.log.push(SpawnCall::Spawned(role));
        Ok(RoleHandle { role, inner })
    }

    fn await_termination(&mut self, handle: Self::Handle) -> Termination {
        let termination = self.inner.await_termination(handle.inner);
        self.log
            .push(SpawnCall::Awaited(handle.role, termination.status.clone()));
        termination
    }

    fn terminate(&mut self, handle: &Self::Handle) {
        self.log.push(SpawnCall::Terminated(handle.role));
        self.inner.terminate(&handle.inner);
    }
}
