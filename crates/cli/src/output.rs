// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;
use sg_engine::RunResult;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_text(self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// End-of-run summary
#[derive(Serialize)]
#[serde(transparent)]
pub struct Summary<'a>(pub &'a RunResult);

fn millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(
            f,
            "Run {} complete: {} runners through {} stages ({}) in {}.",
            r.run_id.short(),
            r.participants,
            r.stages,
            r.model,
            humantime::format_duration(millis(r.elapsed))
        )?;
        write!(
            f,
            "Barrier rounds: stage {}, gate {}.",
            r.stage_rounds, r.gate_rounds
        )?;
        for outcome in &r.outcomes {
            write!(f, "\n  {:<12} {}", outcome.role.to_string(), outcome.status)?;
            if let Some(report) = &outcome.report {
                if !outcome.role.is_coordinator() {
                    write!(f, ", busy {}", humantime::format_duration(millis(report.busy)))?;
                }
            }
        }
        Ok(())
    }
}
