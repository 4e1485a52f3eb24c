// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staged lockstep protocol
//!
//! Each stage, every runner works and then waits at the stage barrier; the
//! coordinator meets them there, does its bookkeeping while they are parked
//! at the gate barrier, then joins them at the gate to open the next stage.

mod coordinator;
mod hooks;
mod runner;
mod state;

pub use coordinator::CoordinatorTask;
pub use hooks::{NoopHooks, StageHooks};
pub use runner::RunnerTask;
pub use state::ParticipantState;

use crate::barrier::{BarrierKind, DualBarrier};
use crate::error::ProtocolError;
use crate::id::{Role, StageIndex};
use serde::Serialize;
use std::time::Duration;

/// What one participant did over a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParticipantReport {
    pub role: Role,
    /// Stages whose gate barrier this participant passed
    pub stages_completed: u32,
    /// Barrier rounds in which this participant got the serial outcome
    pub serial_rounds: u32,
    /// Time spent in stage work
    #[serde(with = "humantime_serde")]
    pub busy: Duration,
}

impl ParticipantReport {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            stages_completed: 0,
            serial_rounds: 0,
            busy: Duration::ZERO,
        }
    }
}

/// Wait at `kind` on behalf of `role`, recording the outcome
fn rendezvous(
    barrier: &DualBarrier,
    kind: BarrierKind,
    stage: StageIndex,
    report: &mut ParticipantReport,
) -> Result<(), ProtocolError> {
    let outcome = barrier.wait(kind).map_err(|source| ProtocolError {
        role: report.role,
        stage,
        barrier: kind,
        source,
    })?;

    if outcome.is_serial() {
        report.serial_rounds += 1;
    }
    if kind == BarrierKind::Gate {
        report.stages_completed += 1;
    }
    tracing::trace!(role = %report.role, %stage, %kind, ?outcome, "passed barrier");
    Ok(())
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
