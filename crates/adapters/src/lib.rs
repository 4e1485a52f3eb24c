// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for creating and reaping participants

pub mod spawn;
pub mod traced;

pub use spawn::{
    Entry, ExitStatus, FaultLayer, ProcessSpawner, SpawnCall, SpawnError, SpawnLayer, SpawnLog,
    Spawner, Termination, ThreadSpawner,
};
pub use traced::{TracedHandle, TracedLayer, TracedSpawner};
