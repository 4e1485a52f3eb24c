// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callbacks the stage protocol calls out to

use crate::id::{ParticipantId, StageIndex};
use std::time::Duration;

/// External behavior plugged into the stage loop.
///
/// Shared by every participant of a run, so implementations must be `Sync`.
/// In the multi-process model each child works on its own copy.
pub trait StageHooks: Sync {
    /// Do one runner's work for one stage, returning how long it took
    fn perform_stage_work(&self, runner: ParticipantId, stage: StageIndex) -> Duration;

    /// Called by the coordinator between the two barriers while every runner
    /// is parked at the gate. Must not block.
    fn on_stage_advance(&self, _next: StageIndex) {}

    fn on_stage_started(&self, _runner: ParticipantId, _stage: StageIndex) {}

    fn on_stage_finished(&self, _runner: ParticipantId, _stage: StageIndex, _took: Duration) {}

    /// The coordinator is about to wait for all runners to finish `stage`
    fn on_awaiting_runners(&self, _stage: StageIndex) {}
}

/// Hooks that do no work at all
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl StageHooks for NoopHooks {
    fn perform_stage_work(&self, _runner: ParticipantId, _stage: StageIndex) -> Duration {
        Duration::ZERO
    }
}

impl<H: StageHooks + ?Sized> StageHooks for &H {
    fn perform_stage_work(&self, runner: ParticipantId, stage: StageIndex) -> Duration {
        (**self).perform_stage_work(runner, stage)
    }

    fn on_stage_advance(&self, next: StageIndex) {
        (**self).on_stage_advance(next)
    }

    fn on_stage_started(&self, runner: ParticipantId, stage: StageIndex) {
        (**self).on_stage_started(runner, stage)
    }

    fn on_stage_finished(&self, runner: ParticipantId, stage: StageIndex, took: Duration) {
        (**self).on_stage_finished(runner, stage, took)
    }

    fn on_awaiting_runners(&self, stage: StageIndex) {
        (**self).on_awaiting_runners(stage)
    }
}
