// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box tests for `sg run`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

/// `sg run` with fast, seeded work
fn sg_run(args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("sg").unwrap();
    cmd.args(["run", "--min-work", "1ms", "--max-work", "5ms", "--seed", "11"])
        .args(args)
        .timeout(Duration::from_secs(60));
    cmd
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn threaded_run_announces_every_stage() {
    let output = sg_run(&["-r", "3", "-s", "2", "-m", "threads"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();

    assert_eq!(count(&stdout, "will take"), 6, "{stdout}");
    assert_eq!(count(&stdout, "Jury starting stage 2."), 1, "{stdout}");
    assert_eq!(count(&stdout, "Runner 3 finished stage 2."), 1, "{stdout}");
    assert_eq!(count(&stdout, "Jury waiting for all runners to finish stage"), 2);
    assert_eq!(count(&stdout, "Jury starting stage 2."), 1, "{stdout}");
    assert!(!stdout.contains("Jury starting stage 3."), "{stdout}");
    assert!(stdout.contains("Barrier rounds: stage 2, gate 2."), "{stdout}");
}

#[test]
fn jury_announces_only_after_every_runner_finished() {
    let output = sg_run(&["-r", "4", "-s", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    for (stage, next) in [(1, 2), (2, 3)] {
        let announce = lines
            .iter()
            .position(|l| *l == format!("Jury starting stage {}.", next))
            .unwrap();
        for runner in 1..=4 {
            let finished = lines
                .iter()
                .position(|l| *l == format!("Runner {} finished stage {}.", runner, stage))
                .unwrap();
            assert!(finished < announce, "{stdout}");
        }
    }
}

#[test]
fn single_runner_single_stage_never_advances() {
    sg_run(&["-r", "1", "-s", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Runner 1 finished stage 1."))
        .stdout(predicate::str::contains("Jury starting stage").not());
}

#[test]
fn multi_process_run_succeeds() {
    sg_run(&["-r", "3", "-s", "2", "-m", "processes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jury starting stage 2."))
        .stdout(predicate::str::contains("(multi-process)"))
        .stdout(predicate::str::contains("Barrier rounds: stage 2, gate 2."));
}

#[test]
fn json_output_is_machine_readable() {
    let output = sg_run(&["-r", "2", "-s", "3", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["participants"], 2);
    assert_eq!(json["stages"], 3);
    assert_eq!(json["gate_rounds"], 3);
    assert_eq!(json["outcomes"].as_array().unwrap().len(), 3);
}

#[test]
fn config_file_supplies_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "participants = 2\nstages = 2\n\n[work]\nmin = \"1ms\"\nmax = \"2ms\""
    )
    .unwrap();

    Command::cargo_bin("sg")
        .unwrap()
        .args(["run", "--format", "json", "--config"])
        .arg(file.path())
        .timeout(Duration::from_secs(60))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"participants\": 2"));
}

#[test]
fn zero_runners_is_an_error() {
    sg_run(&["-r", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error: participant count must be positive",
        ));
}

#[test]
fn unknown_model_is_rejected() {
    sg_run(&["-m", "fibers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fibers"));
}

#[test]
fn spawn_failure_aborts_without_hanging() {
    sg_run(&["-r", "5", "-s", "2", "--fail-spawn-after", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: spawn error"))
        .stderr(predicate::str::contains("stopped and reaped"))
        .stdout(predicate::str::contains("Jury starting stage").not());
}

#[test]
fn spawn_failure_with_processes_aborts_without_hanging() {
    sg_run(&["-r", "5", "-s", "2", "-m", "processes", "--fail-spawn-after", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("runner-3"));
}

#[test]
fn completions_are_generated() {
    Command::cargo_bin("sg")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sg"));
}
