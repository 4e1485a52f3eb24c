use super::*;
use sg_core::{BarrierKind, ParticipantId, ResourceError, StageIndex};
use std::time::Duration;
use yare::parameterized;

fn report(role: Role) -> ParticipantReport {
    ParticipantReport {
        role,
        stages_completed: 1,
        serial_rounds: 0,
        busy: Duration::ZERO,
    }
}

fn protocol_error(role: Role) -> ProtocolError {
    ProtocolError {
        role,
        stage: StageIndex(0),
        barrier: BarrierKind::Stage,
        source: ResourceError::Aborted(BarrierKind::Stage),
    }
}

const RUNNER: Role = Role::Runner(ParticipantId(0));

// =============================================================================
// Thread spawner
// =============================================================================

#[test]
fn thread_returns_report_on_success() {
    let termination = std::thread::scope(|s| {
        let mut spawner = ThreadSpawner::new(s);
        let handle = spawner
            .spawn(RUNNER, Box::new(|| Ok(report(RUNNER))))
            .unwrap();
        spawner.await_termination(handle)
    });

    assert_eq!(termination, Termination::success(Some(report(RUNNER))));
}

#[test]
fn thread_error_becomes_failed_status() {
    let termination = std::thread::scope(|s| {
        let mut spawner = ThreadSpawner::new(s);
        let handle = spawner
            .spawn(RUNNER, Box::new(|| Err(protocol_error(RUNNER))))
            .unwrap();
        spawner.await_termination(handle)
    });

    assert!(matches!(termination.status, ExitStatus::Failed(ref reason) if reason.contains("aborted")));
    assert_eq!(termination.report, None);
}

#[test]
fn thread_panic_becomes_failed_status() {
    let termination = std::thread::scope(|s| {
        let mut spawner = ThreadSpawner::new(s);
        let handle = spawner
            .spawn(
                RUNNER,
                Box::new(|| -> Result<ParticipantReport, ProtocolError> { panic!("boom") }),
            )
            .unwrap();
        spawner.await_termination(handle)
    });

    assert_eq!(termination.status, ExitStatus::Failed("panicked".to_string()));
}

#[test]
fn threads_are_named_after_roles() {
    std::thread::scope(|s| {
        let mut spawner = ThreadSpawner::new(s);
        let runner = spawner
            .spawn(Role::Runner(ParticipantId(2)), Box::new(|| Ok(report(RUNNER))))
            .unwrap();
        let coordinator = spawner
            .spawn(Role::Coordinator, Box::new(|| Ok(report(Role::Coordinator))))
            .unwrap();

        assert_eq!(runner.thread().name(), Some("sg-runner-3"));
        assert_eq!(coordinator.thread().name(), Some("sg-coordinator"));
        spawner.await_termination(runner);
        spawner.await_termination(coordinator);
    });
}

#[test]
fn thread_entry_may_borrow_from_enclosing_stack() {
    let borrowed = String::from("stack data");
    let termination = std::thread::scope(|s| {
        let mut spawner = ThreadSpawner::new(s);
        let borrowed = &borrowed;
        let handle = spawner
            .spawn(
                RUNNER,
                Box::new(move || {
                    assert_eq!(borrowed, "stack data");
                    Ok(report(RUNNER))
                }),
            )
            .unwrap();
        spawner.await_termination(handle)
    });
    assert!(termination.status.is_success());
}

// =============================================================================
// Process spawner
// =============================================================================

#[test]
fn child_success_exits_zero() {
    let mut spawner = ProcessSpawner::new();
    let pid = spawner
        .spawn(RUNNER, Box::new(|| Ok(report(RUNNER))))
        .unwrap();

    let termination = spawner.await_termination(pid);

    // Reports stay in the child
    assert_eq!(termination, Termination::success(None));
}

#[test]
fn child_protocol_error_exits_nonzero() {
    let mut spawner = ProcessSpawner::new();
    let pid = spawner
        .spawn(RUNNER, Box::new(|| Err(protocol_error(RUNNER))))
        .unwrap();

    let termination = spawner.await_termination(pid);

    assert_eq!(termination.status, ExitStatus::Exited(EXIT_PROTOCOL_FAILURE));
}

#[test]
fn terminated_child_reports_signal() {
    let mut spawner = ProcessSpawner::new();
    let pid = spawner
        .spawn(
            RUNNER,
            Box::new(|| {
                std::thread::sleep(Duration::from_secs(60));
                Ok(report(RUNNER))
            }),
        )
        .unwrap();

    spawner.terminate(&pid);
    let termination = spawner.await_termination(pid);

    assert_eq!(termination.status, ExitStatus::Signaled("SIGKILL".to_string()));
}

// =============================================================================
// Fault layer
// =============================================================================

#[test]
fn fault_layer_refuses_after_budget() {
    let layer = FaultLayer::fail_after(2);
    let log = layer.log().clone();

    std::thread::scope(|s| {
        let mut spawner = layer.layer(ThreadSpawner::new(s));
        let mut handles = Vec::new();
        for i in 0..2 {
            let role = Role::Runner(ParticipantId(i));
            handles.push(spawner.spawn(role, Box::new(move || Ok(report(role)))).unwrap());
        }

        let err = spawner
            .spawn(Role::Coordinator, Box::new(|| Ok(report(Role::Coordinator))))
            .err()
            .unwrap();
        assert!(matches!(err, SpawnError::Injected { allowed: 2, .. }));
        assert_eq!(err.role(), Role::Coordinator);

        for handle in handles {
            spawner.await_termination(handle);
        }
    });

    assert_eq!(
        log.spawned(),
        vec![Role::Runner(ParticipantId(0)), Role::Runner(ParticipantId(1))]
    );
    assert!(log.calls().contains(&SpawnCall::Refused(Role::Coordinator)));
    assert_eq!(log.awaited().len(), 2);
}

#[test]
fn record_only_layer_records_terminate_and_await() {
    let layer = FaultLayer::record_only();

    std::thread::scope(|s| {
        let mut spawner = layer.layer(ThreadSpawner::new(s));
        let handle = spawner
            .spawn(RUNNER, Box::new(|| Ok(report(RUNNER))))
            .unwrap();
        spawner.terminate(&handle);
        spawner.await_termination(handle);
    });

    assert_eq!(
        layer.log().calls(),
        vec![
            SpawnCall::Spawned(RUNNER),
            SpawnCall::Terminated(RUNNER),
            SpawnCall::Awaited(RUNNER, ExitStatus::Success),
        ]
    );
}

#[test]
fn layers_compose_in_order() {
    let inner = FaultLayer::record_only();
    let outer = FaultLayer::fail_after(0);

    std::thread::scope(|s| {
        let layers = (&inner, &outer);
        let mut spawner = layers.layer(ThreadSpawner::new(s));
        assert!(spawner
            .spawn(RUNNER, Box::new(|| Ok(report(RUNNER))))
            .is_err());
    });

    // The outer layer refused before the inner one saw anything
    assert!(inner.log().calls().is_empty());
    assert_eq!(outer.log().calls(), vec![SpawnCall::Refused(RUNNER)]);
}

#[parameterized(
    success = { ExitStatus::Success, "success" },
    exited = { ExitStatus::Exited(3), "exited with code 3" },
    signaled = { ExitStatus::Signaled("SIGKILL".to_string()), "killed by SIGKILL" },
    failed = { ExitStatus::Failed("panicked".to_string()), "failed: panicked" },
)]
fn exit_status_display(status: ExitStatus, expected: &str) {
    assert_eq!(status.to_string(), expected);
    assert_eq!(status.is_success(), expected == "success");
}
