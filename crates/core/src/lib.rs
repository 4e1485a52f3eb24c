// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sg-core: Core library for stagegate
//!
//! This crate provides:
//! - The dual barrier (stage + gate) in process-local or shared-memory storage
//! - Runner and coordinator control loops for staged lockstep
//! - Run configuration and error types

pub mod barrier;
pub mod config;
pub mod error;
pub mod id;
pub mod protocol;

pub use barrier::{BarrierKind, DualBarrier, WaitOutcome};
pub use config::{ExecutionModel, FileConfig, RunConfig, WorkConfig};
pub use error::{ConfigError, ProtocolError, ResourceError};
pub use id::{ParticipantId, Role, RunId, StageIndex};
pub use protocol::{
    CoordinatorTask, NoopHooks, ParticipantReport, ParticipantState, RunnerTask, StageHooks,
};
