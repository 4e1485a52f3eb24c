// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution host

use sg_adapters::{ExitStatus, SpawnError};
use sg_core::{ConfigError, ResourceError, Role};
use thiserror::Error;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("barrier error: {0}")]
    Resource(#[from] ResourceError),
    #[error("spawn error: {0}")]
    Spawn(#[from] SpawnError),
    #[error("{role} did not finish cleanly: {status}")]
    ParticipantFailed { role: Role, status: ExitStatus },
}
