// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cyclic barrier for participants sharing one address space

use super::{Fault, Rendezvous, WaitOutcome};
use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct LocalState {
    /// Parties parked in the current round
    arrived: usize,
    /// Completed rounds
    generation: u64,
    aborted: bool,
}

/// Generation-counting barrier built on a mutex and condition variable.
#[derive(Debug)]
pub(crate) struct LocalBarrier {
    parties: usize,
    state: Mutex<LocalState>,
    released: Condvar,
}

impl LocalBarrier {
    pub(crate) fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(LocalState::default()),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Rendezvous for LocalBarrier {
    fn wait(&self) -> Result<WaitOutcome, Fault> {
        let mut state = self.lock();
        if state.aborted {
            return Err(Fault::Aborted);
        }
        if state.arrived >= self.parties {
            return Err(Fault::Corrupted);
        }

        let generation = state.generation;
        state.arrived += 1;

        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return Ok(WaitOutcome::Serial);
        }

        while state.generation == generation && !state.aborted {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }

        if state.generation == generation {
            // Woken by abort before the round filled up
            state.arrived -= 1;
            return Err(Fault::Aborted);
        }
        Ok(WaitOutcome::Normal)
    }

    fn abort(&self) {
        let mut state = self.lock();
        state.aborted = true;
        self.released.notify_all();
    }

    fn is_aborted(&self) -> bool {
        self.lock().aborted
    }

    fn rounds(&self) -> u64 {
        self.lock().generation
    }

    fn waiting(&self) -> usize {
        self.lock().arrived
    }
}
