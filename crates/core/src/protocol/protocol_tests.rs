use super::*;
use crate::error::ResourceError;
use crate::id::ParticipantId;
use std::sync::Mutex;
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Call {
    Started(ParticipantId, StageIndex),
    Finished(ParticipantId, StageIndex),
    Awaiting(StageIndex),
    Advanced(StageIndex),
}

/// Hooks that log every callback in the order they happened
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn position(&self, call: Call) -> usize {
        self.calls()
            .iter()
            .position(|c| *c == call)
            .unwrap_or_else(|| panic!("{:?} never happened", call))
    }
}

impl StageHooks for Recorder {
    fn perform_stage_work(&self, _runner: ParticipantId, _stage: StageIndex) -> Duration {
        thread::sleep(Duration::from_millis(1));
        Duration::from_millis(1)
    }

    fn on_stage_advance(&self, next: StageIndex) {
        // Widen the window in which an early runner would be caught
        thread::sleep(Duration::from_millis(5));
        self.record(Call::Advanced(next));
    }

    fn on_stage_started(&self, runner: ParticipantId, stage: StageIndex) {
        self.record(Call::Started(runner, stage));
    }

    fn on_stage_finished(&self, runner: ParticipantId, stage: StageIndex, _took: Duration) {
        self.record(Call::Finished(runner, stage));
    }

    fn on_awaiting_runners(&self, stage: StageIndex) {
        self.record(Call::Awaiting(stage));
    }
}

/// Run one coordinator and `runners` runners on scoped threads
fn run_protocol<H: StageHooks>(
    runners: u32,
    stages: u32,
    hooks: &H,
) -> (DualBarrier, ParticipantReport, Vec<ParticipantReport>) {
    let owned = DualBarrier::create(runners as usize, false).unwrap();
    let barrier = &owned;

    let (coordinator, runner_reports) = thread::scope(|s| {
        let coordinator = s.spawn(move || CoordinatorTask::new(stages, barrier, hooks).run());
        let handles: Vec<_> = (0..runners)
            .map(|i| {
                s.spawn(move || RunnerTask::new(ParticipantId(i), stages, barrier, hooks).run())
            })
            .collect();

        let reports: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        (coordinator.join().unwrap().unwrap(), reports)
    });

    (owned, coordinator, runner_reports)
}

#[test]
fn three_runners_two_stages() {
    let recorder = Recorder::default();

    let (barrier, coordinator, runners) = run_protocol(3, 2, &recorder);

    assert_eq!(barrier.rounds(BarrierKind::Stage), 2);
    assert_eq!(barrier.rounds(BarrierKind::Gate), 2);

    let advances: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Advanced(_)))
        .collect();
    assert_eq!(advances, vec![Call::Advanced(StageIndex(1))]);

    assert_eq!(coordinator.role, Role::Coordinator);
    assert_eq!(coordinator.stages_completed, 2);
    for (i, report) in runners.iter().enumerate() {
        assert_eq!(report.role, Role::Runner(ParticipantId(i as u32)));
        assert_eq!(report.stages_completed, 2);
        assert_eq!(report.busy, Duration::from_millis(2));
    }

    // One serial outcome per round, four rounds in total
    let serials: u32 = runners
        .iter()
        .chain(std::iter::once(&coordinator))
        .map(|r| r.serial_rounds)
        .sum();
    assert_eq!(serials, 4);

    barrier.destroy().unwrap();
}

#[test]
fn one_runner_one_stage_never_advances() {
    let recorder = Recorder::default();

    let (barrier, coordinator, runners) = run_protocol(1, 1, &recorder);

    assert_eq!(barrier.parties(), 2);
    assert_eq!(barrier.rounds(BarrierKind::Stage), 1);
    assert_eq!(barrier.rounds(BarrierKind::Gate), 1);
    assert!(!recorder
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Advanced(_))));
    assert_eq!(coordinator.stages_completed, 1);
    assert_eq!(runners[0].stages_completed, 1);
    barrier.destroy().unwrap();
}

#[test]
fn no_runner_starts_a_stage_before_it_is_announced() {
    let recorder = Recorder::default();
    let (runners, stages) = (4, 4);

    let (barrier, _, _) = run_protocol(runners, stages, &recorder);

    for stage in 1..stages {
        let announced = recorder.position(Call::Advanced(StageIndex(stage)));
        for runner in 0..runners {
            let started = recorder.position(Call::Started(ParticipantId(runner), StageIndex(stage)));
            assert!(
                started > announced,
                "runner {} started stage {} before it was announced",
                runner,
                stage
            );
        }
    }
    barrier.destroy().unwrap();
}

#[test]
fn announcement_waits_for_every_runner_to_finish() {
    let recorder = Recorder::default();
    let (runners, stages) = (3, 3);

    let (barrier, _, _) = run_protocol(runners, stages, &recorder);

    for stage in 0..stages - 1 {
        let announced = recorder.position(Call::Advanced(StageIndex(stage + 1)));
        for runner in 0..runners {
            let finished =
                recorder.position(Call::Finished(ParticipantId(runner), StageIndex(stage)));
            assert!(finished < announced);
        }
    }
    barrier.destroy().unwrap();
}

#[test]
fn coordinator_awaits_each_stage() {
    let recorder = Recorder::default();

    let (barrier, _, _) = run_protocol(2, 3, &recorder);

    let awaiting: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Awaiting(_)))
        .collect();
    assert_eq!(
        awaiting,
        vec![
            Call::Awaiting(StageIndex(0)),
            Call::Awaiting(StageIndex(1)),
            Call::Awaiting(StageIndex(2)),
        ]
    );
    barrier.destroy().unwrap();
}

#[test]
fn runner_reports_aborted_barrier() {
    let barrier = DualBarrier::create(2, false).unwrap();
    barrier.abort();

    let err = RunnerTask::new(ParticipantId(1), 3, &barrier, &NoopHooks)
        .run()
        .unwrap_err();

    assert_eq!(err.role, Role::Runner(ParticipantId(1)));
    assert_eq!(err.stage, StageIndex(0));
    assert_eq!(err.barrier, BarrierKind::Stage);
    assert!(matches!(err.source, ResourceError::Aborted(BarrierKind::Stage)));
    assert!(err.to_string().contains("runner-2"));
}

#[test]
fn coordinator_reports_aborted_barrier() {
    let barrier = DualBarrier::create(1, false).unwrap();
    barrier.abort();

    let err = CoordinatorTask::new(1, &barrier, &NoopHooks)
        .run()
        .unwrap_err();

    assert_eq!(err.role, Role::Coordinator);
    assert_eq!(err.barrier, BarrierKind::Stage);
}

#[test]
fn noop_hooks_do_no_work() {
    assert_eq!(
        NoopHooks.perform_stage_work(ParticipantId(0), StageIndex(0)),
        Duration::ZERO
    );
}
