// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced spawner wrapper for consistent observability

use crate::spawn::{Entry, SpawnError, SpawnLayer, Spawner, Termination};
use sg_core::Role;
use std::time::Instant;

/// Layer that wraps any spawner in a [`TracedSpawner`]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracedLayer;

impl SpawnLayer for TracedLayer {
    fn layer<'a, S: Spawner<'a>>(&self, inner: S) -> impl Spawner<'a> {
        TracedSpawner::new(inner)
    }
}

/// Handle that remembers who it belongs to and when it started
pub struct TracedHandle<H> {
    role: Role,
    spawned_at: Instant,
    inner: H,
}

/// Wrapper that adds tracing to any Spawner
#[derive(Clone)]
pub struct TracedSpawner<S> {
    inner: S,
}

impl<S> TracedSpawner<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<'a, S: Spawner<'a>> Spawner<'a> for TracedSpawner<S> {
    type Handle = TracedHandle<S::Handle>;

    fn spawn(&mut self, role: Role, entry: Entry<'a>) -> Result<Self::Handle, SpawnError> {
        let span = tracing::info_span!("participant.spawn", %role);
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.spawn(role, entry);
        let elapsed = start.elapsed();

        match result {
            Ok(inner) => {
                tracing::info!(elapsed_us = elapsed.as_micros() as u64, "spawned");
                Ok(TracedHandle {
                    role,
                    spawned_at: Instant::now(),
                    inner,
                })
            }
            Err(e) => {
                tracing::error!(
                    elapsed_us = elapsed.as_micros() as u64,
                    error = %e,
                    "spawn failed"
                );
                Err(e)
            }
        }
    }

    fn await_termination(&mut self, handle: Self::Handle) -> Termination {
        let span = tracing::info_span!("participant.await", role = %handle.role);
        let _guard = span.enter();

        tracing::debug!("awaiting termination");
        let termination = self.inner.await_termination(handle.inner);
        let lifetime_ms = handle.spawned_at.elapsed().as_millis() as u64;

        if termination.status.is_success() {
            tracing::info!(lifetime_ms, "terminated");
        } else {
            tracing::error!(lifetime_ms, status = %termination.status, "terminated abnormally");
        }
        termination
    }

    fn terminate(&mut self, handle: &Self::Handle) {
        let span = tracing::info_span!("participant.terminate", role = %handle.role);
        let _guard = span.enter();

        // Only happens when the run is already being torn down
        tracing::warn!("terminating");
        self.inner.terminate(&handle.inner);
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
