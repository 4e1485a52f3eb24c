// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-participant stage state machine
//!
//! Runner and coordinator walk the same states:
//!
//! ```text
//! Working(0) -> AtStageBarrier(0) -> AtGateBarrier(0) -> Working(1) -> ... -> Done
//! ```

use crate::barrier::BarrierKind;
use crate::id::StageIndex;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum ParticipantState {
    Working(StageIndex),
    AtStageBarrier(StageIndex),
    AtGateBarrier(StageIndex),
    Done,
}

impl ParticipantState {
    /// Initial state of every participant
    pub fn start() -> Self {
        ParticipantState::Working(StageIndex(0))
    }

    /// Pure transition: the state after the current step completes
    pub fn advance(self, stage_count: u32) -> Self {
        match self {
            ParticipantState::Working(stage) => ParticipantState::AtStageBarrier(stage),
            ParticipantState::AtStageBarrier(stage) => ParticipantState::AtGateBarrier(stage),
            ParticipantState::AtGateBarrier(stage) if stage.is_last(stage_count) => {
                ParticipantState::Done
            }
            ParticipantState::AtGateBarrier(stage) => ParticipantState::Working(stage.next()),
            ParticipantState::Done => ParticipantState::Done,
        }
    }

    pub fn stage(&self) -> Option<StageIndex> {
        match self {
            ParticipantState::Working(stage)
            | ParticipantState::AtStageBarrier(stage)
            | ParticipantState::AtGateBarrier(stage) => Some(*stage),
            ParticipantState::Done => None,
        }
    }

    /// The barrier this state waits on, if any
    pub fn barrier(&self) -> Option<BarrierKind> {
        match self {
            ParticipantState::AtStageBarrier(_) => Some(BarrierKind::Stage),
            ParticipantState::AtGateBarrier(_) => Some(BarrierKind::Gate),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ParticipantState::Done)
    }
}

impl fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantState::Working(stage) => write!(f, "working:{}", stage),
            ParticipantState::AtStageBarrier(stage) => write!(f, "stage-barrier:{}", stage),
            ParticipantState::AtGateBarrier(stage) => write!(f, "gate-barrier:{}", stage),
            ParticipantState::Done => write!(f, "done"),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
