// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated stage work with console announcements

use sg_core::{ParticipantId, StageHooks, StageIndex, WorkConfig};
use std::time::Duration;

/// Sleeps a random duration per runner and stage, announcing progress.
///
/// Durations depend only on the seed, the runner and the stage, so forked
/// children agree with each other without sharing generator state.
#[derive(Debug, Clone)]
pub struct SimulatedWork {
    min: Duration,
    max: Duration,
    seed: u64,
    announce: bool,
}

impl SimulatedWork {
    pub fn new(config: &WorkConfig, announce: bool) -> Self {
        Self {
            min: config.min,
            max: config.max,
            seed: config.seed.unwrap_or_else(|| fastrand::u64(..)),
            announce,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// How long `runner` works on `stage`, whole milliseconds in `[min, max]`
    pub fn duration_for(&self, runner: ParticipantId, stage: StageIndex) -> Duration {
        let slot = (u64::from(runner.0) << 32) | u64::from(stage.0);
        let mut rng = fastrand::Rng::with_seed(self.seed ^ slot.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rng.u64(min..=max))
    }

    fn say(&self, line: std::fmt::Arguments<'_>) {
        if self.announce {
            println!("{}", line);
        }
    }
}

impl StageHooks for SimulatedWork {
    fn perform_stage_work(&self, runner: ParticipantId, stage: StageIndex) -> Duration {
        let took = self.duration_for(runner, stage);
        self.say(format_args!(
            "Runner {} starting stage {}, will take {}.",
            runner,
            stage,
            humantime::format_duration(took)
        ));
        std::thread::sleep(took);
        took
    }

    fn on_stage_finished(&self, runner: ParticipantId, stage: StageIndex, _took: Duration) {
        self.say(format_args!("Runner {} finished stage {}.", runner, stage));
    }

    fn on_awaiting_runners(&self, stage: StageIndex) {
        self.say(format_args!(
            "Jury waiting for all runners to finish stage {}.",
            stage
        ));
    }

    fn on_stage_advance(&self, next: StageIndex) {
        self.say(format_args!("Jury starting stage {}.", next));
    }
}

#[cfg(test)]
#[path = "work_tests.rs"]
mod tests;
