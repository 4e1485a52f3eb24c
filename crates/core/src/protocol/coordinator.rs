// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator (jury) control loop

use super::{rendezvous, ParticipantReport, ParticipantState, StageHooks};
use crate::barrier::{BarrierKind, DualBarrier};
use crate::error::ProtocolError;
use crate::id::Role;

/// The privileged participant that gates stage transitions.
///
/// It announces the next stage because of its role, not because it happened
/// to receive the serial outcome at the stage barrier.
pub struct CoordinatorTask<'a, H: ?Sized> {
    stage_count: u32,
    barrier: &'a DualBarrier,
    hooks: &'a H,
}

impl<'a, H: StageHooks + ?Sized> CoordinatorTask<'a, H> {
    pub fn new(stage_count: u32, barrier: &'a DualBarrier, hooks: &'a H) -> Self {
        Self {
            stage_count,
            barrier,
            hooks,
        }
    }

    pub fn run(self) -> Result<ParticipantReport, ProtocolError> {
        let span = tracing::info_span!("coordinator");
        let _guard = span.enter();

        let mut report = ParticipantReport::new(Role::Coordinator);
        let mut state = ParticipantState::start();

        while !state.is_done() {
            match state {
                ParticipantState::Working(stage) => {
                    self.hooks.on_awaiting_runners(stage);
                }
                ParticipantState::AtStageBarrier(stage) => {
                    rendezvous(self.barrier, BarrierKind::Stage, stage, &mut report)?;

                    // Every runner is now headed for the gate
                    if !stage.is_last(self.stage_count) {
                        tracing::info!(next = %stage.next(), "advancing stage");
                        self.hooks.on_stage_advance(stage.next());
                    }
                }
                ParticipantState::AtGateBarrier(stage) => {
                    rendezvous(self.barrier, BarrierKind::Gate, stage, &mut report)?;
                }
                ParticipantState::Done => {}
            }
            state = state.advance(self.stage_count);
        }

        tracing::debug!(stages = report.stages_completed, "coordinator done");
        Ok(report)
    }
}
