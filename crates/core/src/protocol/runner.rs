// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner control loop

use super::{rendezvous, ParticipantReport, ParticipantState, StageHooks};
use crate::barrier::DualBarrier;
use crate::error::ProtocolError;
use crate::id::{ParticipantId, Role};

/// One runner working through every stage.
///
/// No runner starts stage `s + 1` before the coordinator opens the gate of
/// stage `s`; the barriers alone enforce that.
pub struct RunnerTask<'a, H: ?Sized> {
    id: ParticipantId,
    stage_count: u32,
    barrier: &'a DualBarrier,
    hooks: &'a H,
}

impl<'a, H: StageHooks + ?Sized> RunnerTask<'a, H> {
    pub fn new(id: ParticipantId, stage_count: u32, barrier: &'a DualBarrier, hooks: &'a H) -> Self {
        Self {
            id,
            stage_count,
            barrier,
            hooks,
        }
    }

    pub fn run(self) -> Result<ParticipantReport, ProtocolError> {
        let span = tracing::info_span!("runner", id = %self.id);
        let _guard = span.enter();

        let mut report = ParticipantReport::new(Role::Runner(self.id));
        let mut state = ParticipantState::start();

        while !state.is_done() {
            match state {
                ParticipantState::Working(stage) => {
                    self.hooks.on_stage_started(self.id, stage);
                    let took = self.hooks.perform_stage_work(self.id, stage);
                    report.busy += took;
                    tracing::debug!(%stage, took_ms = took.as_millis() as u64, "stage work done");
                    self.hooks.on_stage_finished(self.id, stage, took);
                }
                ParticipantState::AtStageBarrier(stage) | ParticipantState::AtGateBarrier(stage) => {
                    if let Some(kind) = state.barrier() {
                        rendezvous(self.barrier, kind, stage, &mut report)?;
                    }
                }
                ParticipantState::Done => {}
            }
            state = state.advance(self.stage_count);
        }

        tracing::debug!(
            stages = report.stages_completed,
            busy_ms = report.busy.as_millis() as u64,
            "runner done"
        );
        Ok(report)
    }
}
