// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for runs, participants and stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one runner. Ranges over `[0, participants)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// 1-based number used in announcements
    pub fn number(self) -> u32 {
        self.0 + 1
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Position in the stage sequence, 0-based.
///
/// Every participant keeps its own copy; the barriers keep the copies in step.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StageIndex(pub u32);

impl StageIndex {
    pub fn next(self) -> Self {
        StageIndex(self.0 + 1)
    }

    /// True when no stage follows this one
    pub fn is_last(self, stage_count: u32) -> bool {
        self.0 + 1 >= stage_count
    }

    /// 1-based number used in announcements
    pub fn number(self) -> u32 {
        self.0 + 1
    }
}

impl fmt::Display for StageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// The part a participant plays in a run.
///
/// The coordinator has no numeric id; it is distinguished by role alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Runner(ParticipantId),
}

impl Role {
    pub fn is_coordinator(&self) -> bool {
        matches!(self, Role::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::Runner(id) => write!(f, "runner-{}", id),
        }
    }
}

/// Correlates the log lines of one run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn generate() -> Self {
        RunId(uuid::Uuid::new_v4().to_string())
    }

    /// First 8 characters, enough to tell runs apart in logs
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
