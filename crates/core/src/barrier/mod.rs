// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-barrier rendezvous for staged lockstep
//!
//! This module provides:
//! - **DualBarrier** - the stage and gate barriers, each sized for every runner plus the coordinator
//! - **LocalBarrier** - storage for participants sharing one address space
//! - **SharedBarrier** - storage placed in memory shared with forked children

mod local;
mod shared;

use crate::error::ResourceError;
use local::LocalBarrier;
use serde::{Deserialize, Serialize};
use shared::{SharedBarrier, SharedPair, SharedRegion};
use std::fmt;

/// Result of a completed rendezvous.
///
/// Exactly one party per round sees `Serial`; which one is arbitrary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    Serial,
    Normal,
}

impl WaitOutcome {
    pub fn is_serial(self) -> bool {
        matches!(self, WaitOutcome::Serial)
    }
}

/// Which of the two barriers to wait on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierKind {
    /// Runners report stage completion to the coordinator
    Stage,
    /// The coordinator admits runners to the next stage
    Gate,
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarrierKind::Stage => write!(f, "stage"),
            BarrierKind::Gate => write!(f, "gate"),
        }
    }
}

/// Storage-independent failure, tagged with a [`BarrierKind`] by the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Fault {
    Aborted,
    Corrupted,
}

impl Fault {
    fn into_error(self, kind: BarrierKind) -> ResourceError {
        match self {
            Fault::Aborted => ResourceError::Aborted(kind),
            Fault::Corrupted => ResourceError::Corrupted(kind),
        }
    }
}

/// A reusable cyclic rendezvous
pub(crate) trait Rendezvous: Sync {
    /// Block until the full quota has arrived in this round
    fn wait(&self) -> Result<WaitOutcome, Fault>;
    /// Fail every current and future waiter
    fn abort(&self);
    fn is_aborted(&self) -> bool;
    /// Completed rounds
    fn rounds(&self) -> u64;
    /// Parties parked in the current round
    fn waiting(&self) -> usize;
}

enum Storage {
    Local {
        stage: LocalBarrier,
        gate: LocalBarrier,
    },
    Shared(SharedRegion<SharedPair>),
}

/// The stage barrier and the gate barrier of one run.
///
/// Both are sized `participants + 1` at construction and never resized.
/// Participants only ever borrow it; whoever created it destroys it once
/// every participant has terminated.
pub struct DualBarrier {
    participants: usize,
    storage: Storage,
}

impl DualBarrier {
    /// Create both barriers for `participants` runners plus the coordinator.
    ///
    /// With `shared` set, the barriers live in a shared anonymous mapping and
    /// stay valid in every process forked afterwards.
    pub fn create(participants: usize, shared: bool) -> Result<Self, ResourceError> {
        if participants == 0 {
            return Err(ResourceError::InvalidParties(participants));
        }
        let parties = participants + 1;

        let storage = if shared {
            let parties =
                u32::try_from(parties).map_err(|_| ResourceError::InvalidParties(participants))?;
            Storage::Shared(SharedRegion::new(SharedPair {
                stage: SharedBarrier::new(parties),
                gate: SharedBarrier::new(parties),
            })?)
        } else {
            Storage::Local {
                stage: LocalBarrier::new(parties),
                gate: LocalBarrier::new(parties),
            }
        };

        tracing::debug!(participants, parties, shared, "created dual barrier");
        Ok(Self {
            participants,
            storage,
        })
    }

    fn barrier(&self, kind: BarrierKind) -> &dyn Rendezvous {
        match (&self.storage, kind) {
            (Storage::Local { stage, .. }, BarrierKind::Stage) => stage,
            (Storage::Local { gate, .. }, BarrierKind::Gate) => gate,
            (Storage::Shared(region), BarrierKind::Stage) => &region.get().stage,
            (Storage::Shared(region), BarrierKind::Gate) => &region.get().gate,
        }
    }

    /// Block until `participants + 1` callers have arrived at `kind` in this round
    pub fn wait(&self, kind: BarrierKind) -> Result<WaitOutcome, ResourceError> {
        self.barrier(kind)
            .wait()
            .map_err(|fault| fault.into_error(kind))
    }

    /// Release every waiter with [`ResourceError::Aborted`] and refuse new ones.
    ///
    /// Used when a party can never arrive, so the others unwind instead of
    /// blocking forever.
    pub fn abort(&self) {
        tracing::warn!(participants = self.participants, "aborting dual barrier");
        self.barrier(BarrierKind::Stage).abort();
        self.barrier(BarrierKind::Gate).abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.barrier(BarrierKind::Stage).is_aborted() || self.barrier(BarrierKind::Gate).is_aborted()
    }

    /// Completed rounds of `kind`
    pub fn rounds(&self, kind: BarrierKind) -> u64 {
        self.barrier(kind).rounds()
    }

    /// Parties currently parked at `kind`
    pub fn waiting(&self, kind: BarrierKind) -> usize {
        self.barrier(kind).waiting()
    }

    /// Runner count the barrier was built for
    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Party count of each barrier
    pub fn parties(&self) -> usize {
        self.participants + 1
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.storage, Storage::Shared(_))
    }

    /// Release both barriers and any shared storage.
    ///
    /// Borrowing rules keep in-process participants from outliving the
    /// barrier, but forked children hold their own mapping. If any party is
    /// still parked at a live barrier, the barrier is aborted so the party
    /// unwinds, the storage is released anyway, and [`ResourceError::Busy`]
    /// reports the teardown-order bug. After an abort the parked counts are
    /// stale and are not checked.
    pub fn destroy(self) -> Result<(), ResourceError> {
        let mut busy = None;
        if !self.is_aborted() {
            busy = [BarrierKind::Stage, BarrierKind::Gate]
                .into_iter()
                .map(|kind| (kind, self.waiting(kind)))
                .find(|(_, waiting)| *waiting > 0);
            if busy.is_some() {
                self.abort();
            }
        }

        let stage_rounds = self.rounds(BarrierKind::Stage);
        let gate_rounds = self.rounds(BarrierKind::Gate);
        match self.storage {
            Storage::Local { .. } => {}
            Storage::Shared(region) => region.unmap()?,
        }

        if let Some((kind, waiting)) = busy {
            tracing::error!(%kind, waiting, "destroyed dual barrier with parked parties");
            return Err(ResourceError::Busy { kind, waiting });
        }
        tracing::debug!(stage_rounds, gate_rounds, "destroyed dual barrier");
        Ok(())
    }
}

impl fmt::Debug for DualBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualBarrier")
            .field("participants", &self.participants)
            .field("shared", &self.is_shared())
            .field("stage_rounds", &self.rounds(BarrierKind::Stage))
            .field("gate_rounds", &self.rounds(BarrierKind::Gate))
            .finish()
    }
}

#[cfg(test)]
#[path = "barrier_tests.rs"]
mod tests;
