// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution host
//!
//! Owns a run from barrier creation to teardown: build the dual barrier, spawn
//! the coordinator and the runners through a [`Spawner`], reap every one of
//! them, and only then destroy the barrier.

use crate::error::HostError;
use serde::Serialize;
use sg_adapters::{
    Entry, ExitStatus, ProcessSpawner, SpawnError, SpawnLayer, Spawner, Termination, ThreadSpawner,
    TracedLayer,
};
use sg_core::{
    BarrierKind, CoordinatorTask, DualBarrier, ExecutionModel, ParticipantId, ParticipantReport,
    ProtocolError, ResourceError, Role, RunConfig, RunId, RunnerTask, StageHooks,
};
use std::time::{Duration, Instant};

/// How one participant ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParticipantOutcome {
    pub role: Role,
    pub status: ExitStatus,
    /// Only available when the participant ran in this process
    pub report: Option<ParticipantReport>,
}

/// Summary of a completed run
#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub model: ExecutionModel,
    pub participants: u32,
    pub stages: u32,
    pub stage_rounds: u64,
    pub gate_rounds: u64,
    /// Coordinator first, then runners in id order
    pub outcomes: Vec<ParticipantOutcome>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl RunResult {
    /// Reports handed back by in-process participants
    pub fn reports(&self) -> impl Iterator<Item = &ParticipantReport> {
        self.outcomes.iter().filter_map(|o| o.report.as_ref())
    }
}

/// Runs one staged lockstep under a chosen execution model
pub struct ExecutionHost<H> {
    config: RunConfig,
    hooks: H,
}

impl<H: StageHooks> ExecutionHost<H> {
    pub fn new(config: RunConfig, hooks: H) -> Self {
        Self { config, hooks }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run to completion with tracing around every spawner call
    pub fn run(&self) -> Result<RunResult, HostError> {
        self.run_layered(())
    }

    /// Like [`run`](Self::run), with `layer` wrapped around the model's
    /// spawner underneath the tracing layer
    pub fn run_layered<L: SpawnLayer>(&self, layer: L) -> Result<RunResult, HostError> {
        self.config.validate()?;

        let run_id = RunId::generate();
        let span = tracing::info_span!("run", run_id = run_id.short(), model = %self.config.model);
        let _guard = span.enter();

        let RunConfig {
            participants,
            stages,
            model,
        } = self.config;
        tracing::info!(participants, stages, "starting run");
        let start = Instant::now();

        let barrier = DualBarrier::create(participants as usize, model.needs_shared_storage())?;
        let layers = (layer, TracedLayer);
        let joined = match model {
            ExecutionModel::Threaded => std::thread::scope(|s| {
                self.drive(&barrier, layers.layer(ThreadSpawner::new(s)))
            }),
            ExecutionModel::MultiProcess => {
                self.drive(&barrier, layers.layer(ProcessSpawner::new()))
            }
        };

        // Every participant has been reaped by now
        let stage_rounds = barrier.rounds(BarrierKind::Stage);
        let gate_rounds = barrier.rounds(BarrierKind::Gate);
        let destroyed = barrier.destroy();

        let outcomes = settle(joined, destroyed)?;

        if let Some(failed) = outcomes.iter().find(|o| !o.status.is_success()) {
            tracing::error!(role = %failed.role, status = %failed.status, "run failed");
            return Err(HostError::ParticipantFailed {
                role: failed.role,
                status: failed.status.clone(),
            });
        }

        let elapsed = start.elapsed();
        tracing::info!(
            stage_rounds,
            gate_rounds,
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(RunResult {
            run_id,
            model,
            participants,
            stages,
            stage_rounds,
            gate_rounds,
            outcomes,
            elapsed,
        })
    }

    /// Spawn coordinator then runners, and reap them all.
    ///
    /// A refused spawn aborts the barrier, terminates and reaps whoever was
    /// already started, and surfaces the spawn error.
    fn drive<'a, S: Spawner<'a>>(
        &'a self,
        barrier: &'a DualBarrier,
        mut spawner: S,
    ) -> Result<Vec<ParticipantOutcome>, SpawnError> {
        let stages = self.config.stages;
        let hooks = &self.hooks;
        let roles = std::iter::once(Role::Coordinator)
            .chain((0..self.config.participants).map(|i| Role::Runner(ParticipantId(i))));

        let mut spawned = Vec::with_capacity(self.config.participants as usize + 1);
        for role in roles {
            let entry: Entry<'a> = match role {
                Role::Coordinator => Box::new(move || {
                    abort_on_failure(barrier, || {
                        CoordinatorTask::new(stages, barrier, hooks).run()
                    })
                }),
                Role::Runner(id) => Box::new(move || {
                    abort_on_failure(barrier, || RunnerTask::new(id, stages, barrier, hooks).run())
                }),
            };

            match spawner.spawn(role, entry) {
                Ok(handle) => spawned.push((role, handle)),
                Err(e) => {
                    tracing::error!(
                        %role,
                        spawned = spawned.len(),
                        error = %e,
                        "spawn refused, tearing down"
                    );
                    barrier.abort();
                    for (_, handle) in &spawned {
                        spawner.terminate(handle);
                    }
                    let reaped = reap(barrier, &mut spawner, spawned);
                    tracing::info!(reaped = reaped.len(), "spawned participants reaped");
                    return Err(e);
                }
            }
        }

        Ok(reap(barrier, &mut spawner, spawned))
    }
}

/// Combine the spawn phase with the barrier teardown.
///
/// A spawn error wins, but a teardown failure behind it is still logged.
fn settle(
    joined: Result<Vec<ParticipantOutcome>, SpawnError>,
    destroyed: Result<(), ResourceError>,
) -> Result<Vec<ParticipantOutcome>, HostError> {
    match joined {
        Ok(outcomes) => {
            destroyed?;
            Ok(outcomes)
        }
        Err(e) => {
            if let Err(teardown) = destroyed {
                tracing::error!(error = %teardown, "barrier teardown failed after spawn error");
            }
            Err(e.into())
        }
    }
}

/// Await every handle in spawn order
fn reap<'a, S: Spawner<'a>>(
    barrier: &DualBarrier,
    spawner: &mut S,
    spawned: Vec<(Role, S::Handle)>,
) -> Vec<ParticipantOutcome> {
    spawned
        .into_iter()
        .map(|(role, handle)| {
            let Termination { status, report } = spawner.await_termination(handle);
            // A dead party can never arrive again
            if !status.is_success() && !barrier.is_aborted() {
                barrier.abort();
            }
            ParticipantOutcome {
                role,
                status,
                report,
            }
        })
        .collect()
}

/// Aborts the barrier unless disarmed, so a participant that errors or
/// panics does not leave the others waiting for it
struct AbortGuard<'b>(Option<&'b DualBarrier>);

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if let Some(barrier) = self.0 {
            if !barrier.is_aborted() {
                barrier.abort();
            }
        }
    }
}

fn abort_on_failure(
    barrier: &DualBarrier,
    body: impl FnOnce() -> Result<ParticipantReport, ProtocolError>,
) -> Result<ParticipantReport, ProtocolError> {
    let mut guard = AbortGuard(Some(barrier));
    let result = body();
    if result.is_ok() {
        guard.0 = None;
    }
    result
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
