// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use sg_adapters::{ExitStatus, SpawnError};
use sg_core::{ConfigError, ResourceError};
use sg_engine::HostError;
use std::fmt;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Explain a rejected configuration
    pub fn from_config(err: &ConfigError) -> Self {
        let base = CliError::new(err.to_string());
        match err {
            ConfigError::Io { .. } | ConfigError::Parse { .. } => {
                base.with_suggestion("Check the file passed to --config")
            }
            ConfigError::InvertedWorkRange { .. } => {
                base.with_suggestion("Make --min-work no larger than --max-work")
            }
            ConfigError::UnknownModel(_) => {
                base.with_suggestion("Use one of: threads, processes")
            }
            ConfigError::ZeroParticipants | ConfigError::ZeroStages => {
                base.with_suggestion("Pass at least one runner and one stage: sg run -r 3 -s 2")
            }
        }
    }

    /// Explain a failed run
    pub fn from_host(err: &HostError) -> Self {
        let base = CliError::new(err.to_string());
        match err {
            HostError::Config(e) => CliError::from_config(e),
            HostError::Spawn(SpawnError::Injected { allowed, .. }) => base
                .with_context(format!("--fail-spawn-after {} refused the next spawn", allowed))
                .with_context("Participants already started were stopped and reaped"),
            HostError::Spawn(_) => base
                .with_context("The system refused to create another thread or process")
                .with_context("Participants already started were stopped and reaped")
                .with_suggestion("Retry with fewer runners"),
            HostError::ParticipantFailed { status, .. } => {
                let base = base.with_context("The barrier was aborted so the others could stop");
                match status {
                    ExitStatus::Signaled(_) => {
                        base.with_suggestion("Check whether something else killed the process")
                    }
                    _ => base.with_suggestion("Rerun with RUST_LOG=debug for the stage trace"),
                }
            }
            HostError::Resource(ResourceError::SharedMap(_)) => base
                .with_context("Shared memory for the multi-process barriers could not be mapped")
                .with_suggestion("Use the threaded model: sg run -m threads"),
            HostError::Resource(_) => base,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}
