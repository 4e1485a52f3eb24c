// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the barrier and the stage protocol

use crate::barrier::BarrierKind;
use crate::id::{Role, StageIndex};
use thiserror::Error;

/// Failures of the synchronization resources themselves.
///
/// Every variant is fatal to a run: a barrier that misbehaves can strand the
/// other participants forever, so nothing here is retried.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("barrier needs at least one runner, got {0}")]
    InvalidParties(usize),
    #[error("shared memory mapping failed: {0}")]
    SharedMap(#[source] nix::Error),
    #[error("shared memory unmap failed: {0}")]
    SharedUnmap(#[source] nix::Error),
    #[error("{0} barrier state is corrupted")]
    Corrupted(BarrierKind),
    #[error("{0} barrier was aborted")]
    Aborted(BarrierKind),
    #[error("{kind} barrier still has {waiting} parked parties")]
    Busy { kind: BarrierKind, waiting: usize },
}

/// A participant could not complete its stage loop.
#[derive(Debug, Error)]
#[error("{role} failed at {barrier} barrier of stage {stage}: {source}")]
pub struct ProtocolError {
    pub role: Role,
    pub stage: StageIndex,
    pub barrier: BarrierKind,
    #[source]
    pub source: ResourceError,
}

/// Invalid run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("participant count must be positive")]
    ZeroParticipants,
    #[error("stage count must be positive")]
    ZeroStages,
    #[error("minimum work duration {min:?} exceeds maximum {max:?}")]
    InvertedWorkRange {
        min: std::time::Duration,
        max: std::time::Duration,
    },
    #[error("unknown execution model: {0}")]
    UnknownModel(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
