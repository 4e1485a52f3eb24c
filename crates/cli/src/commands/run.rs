// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sg run` - Run runners and a jury through staged lockstep

use crate::output::{self, OutputFormat, Summary};
use crate::work::SimulatedWork;
use anyhow::Result;
use clap::Args;
use sg_adapters::FaultLayer;
use sg_core::{ConfigError, ExecutionModel, FileConfig, RunConfig, WorkConfig};
use sg_engine::ExecutionHost;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// TOML file with run and work settings; flags override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of runners (the jury is extra)
    #[arg(short, long)]
    pub runners: Option<u32>,

    /// Number of stages
    #[arg(short, long)]
    pub stages: Option<u32>,

    /// Execution model: threads or processes
    #[arg(short, long)]
    pub model: Option<ExecutionModel>,

    /// Shortest simulated stage work (e.g. 1s, 250ms)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub min_work: Option<Duration>,

    /// Longest simulated stage work
    #[arg(long, value_parser = humantime::parse_duration)]
    pub max_work: Option<Duration>,

    /// Seed for reproducible work durations
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Refuse every spawn after this many succeed
    #[arg(long, hide = true)]
    pub fail_spawn_after: Option<usize>,
}

impl RunArgs {
    /// Merge the config file, if any, with the flags
    pub fn resolve(&self) -> Result<(RunConfig, WorkConfig), ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut run = file.run_config();
        if let Some(runners) = self.runners {
            run.participants = runners;
        }
        if let Some(stages) = self.stages {
            run.stages = stages;
        }
        if let Some(model) = self.model {
            run.model = model;
        }

        let mut work = file.work.unwrap_or_default();
        if let Some(min) = self.min_work {
            work.min = min;
        }
        if let Some(max) = self.max_work {
            work.max = max;
        }
        if self.seed.is_some() {
            work.seed = self.seed;
        }

        run.validate()?;
        work.validate()?;
        Ok((run, work))
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let (config, work) = args.resolve()?;
    let hooks = SimulatedWork::new(&work, args.format.is_text());
    tracing::debug!(?config, seed = hooks.seed(), "resolved run");

    let host = ExecutionHost::new(config, hooks);
    let result = match args.fail_spawn_after {
        Some(allowed) => host.run_layered(FaultLayer::fail_after(allowed))?,
        None => host.run()?,
    };

    output::print(&Summary(&result), args.format);
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
