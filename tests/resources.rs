use sched_sim::*;

mod common;

use common::{rid, InvariantMonitor};

/// A contended acquire blocks the requester for the tick without aging it;
/// the requester retries at the same age once the owner releases.
#[test]
fn test_blocked_tick_does_not_age() {
    common::setup_test();
    let scenario = Scenario::builder()
        .add_process("owner", 0, 4, 0)
        .hold(rid(0), 0, 3)
        .add_process("requester", 0, 2, 0)
        .hold(rid(0), 0, 1)
        .build();

    let trace = common::run_to_completion(Policy::Rr, scenario);

    assert_eq!(
        trace.dispatch_sequence(),
        vec![
            Some(Pid(0)),
            Some(Pid(1)),
            Some(Pid(0)),
            Some(Pid(0)),
            Some(Pid(1)),
            Some(Pid(0)),
            Some(Pid(1)),
        ]
    );
    assert_eq!(trace.blocked_count(Pid(1)), 1);
    assert_eq!(trace.run_count(Pid(1)), 2);
    assert_eq!(trace.end_tick(), 7);

    let requester_events: Vec<(Tick, &TraceKind)> = trace
        .events()
        .iter()
        .filter(|e| match e.kind {
            TraceKind::Acquired { pid, .. }
            | TraceKind::Released { pid, .. }
            | TraceKind::Blocked { pid, .. }
            | TraceKind::Woke { pid, .. } => pid == Pid(1),
            _ => false,
        })
        .map(|e| (e.tick, &e.kind))
        .collect();
    assert_eq!(
        requester_events,
        vec![
            (
                1,
                &TraceKind::Blocked {
                    pid: Pid(1),
                    resource: rid(0)
                }
            ),
            (
                3,
                &TraceKind::Woke {
                    pid: Pid(1),
                    resource: rid(0)
                }
            ),
            (
                4,
                &TraceKind::Acquired {
                    pid: Pid(1),
                    resource: rid(0)
                }
            ),
            (
                4,
                &TraceKind::Released {
                    pid: Pid(1),
                    resource: rid(0)
                }
            ),
        ]
    );
}

/// Several requests due at the same age are taken in declaration order and
/// released when each hold ends.
#[test]
fn test_multiple_holds_same_age() {
    common::setup_test();
    let scenario = Scenario::builder()
        .add_process("multi", 0, 5, 0)
        .hold(rid(31), 1, 1)
        .hold(rid(0), 1, 3)
        .hold(rid(0), 4, 1)
        .build();

    let trace = common::run_to_completion(Policy::Fifo, scenario);

    let holds: Vec<(Tick, String)> = trace
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            TraceKind::Acquired { resource, .. } => Some((e.tick, format!("+{resource}"))),
            TraceKind::Released { resource, .. } => Some((e.tick, format!("-{resource}"))),
            _ => None,
        })
        .collect();
    let expected: Vec<(Tick, String)> = [
        (1, "+31"),
        (1, "+0"),
        (1, "-31"),
        (3, "-0"),
        (4, "+0"),
        (4, "-0"),
    ]
    .into_iter()
    .map(|(t, s)| (t, s.to_string()))
    .collect();
    assert_eq!(holds, expected);
}

/// Two processes each holding what the other needs end the run in
/// deadlock once nobody is runnable.
#[test]
fn test_deadlock_detected() {
    common::setup_test();
    let scenario = Scenario::builder()
        .add_process("a", 0, 4, 0)
        .hold(rid(0), 0, 4)
        .hold(rid(1), 1, 2)
        .add_process("b", 0, 4, 0)
        .hold(rid(1), 0, 4)
        .hold(rid(0), 1, 2)
        .build();

    let trace = Simulator::new(Policy::Rr).run(scenario);
    trace.dump();

    assert_eq!(trace.exit_kind(), &ExitKind::Deadlock);
    assert!(trace.has_error());
    assert_eq!(trace.end_tick(), 4);
    assert_eq!(trace.blocked_count(Pid(0)), 1);
    assert_eq!(trace.blocked_count(Pid(1)), 1);
}

/// A run that outlasts `max_ticks` stops at the limit.
#[test]
fn test_tick_limit() {
    common::setup_test();
    let scenario = Scenario::builder()
        .add_process("forever", 0, 1_000, 0)
        .max_ticks(20)
        .build();

    let trace = Simulator::new(Policy::Fifo).run(scenario);

    assert_eq!(trace.exit_kind(), &ExitKind::TickLimit);
    assert_eq!(trace.end_tick(), 20);
    assert_eq!(trace.run_count(Pid(0)), 20);
}

/// Structural invariants and owner uniqueness hold at every probe point
/// for every policy on a contended workload.
#[test]
fn test_invariants_under_contention() {
    common::setup_test();
    let make_scenario = || {
        Scenario::builder()
            .add_process("a", 0, 6, 1)
            .hold(rid(0), 0, 3)
            .hold(rid(1), 2, 3)
            .add_process("b", 1, 5, 4)
            .hold(rid(1), 0, 2)
            .hold(rid(0), 1, 3)
            .add_process("c", 1, 4, 2)
            .hold(rid(0), 1, 2)
            .add_process("d", 3, 3, 6)
            .hold(rid(1), 0, 1)
            .build()
    };

    for policy in Policy::ALL {
        let mut monitor = InvariantMonitor::new();
        let trace = Simulator::new(policy).run_with_monitor(make_scenario(), &mut monitor);
        assert!(monitor.samples > 0);
        assert_eq!(monitor.violation, None, "{policy}");
        assert!(
            matches!(trace.exit_kind(), ExitKind::Completed | ExitKind::Deadlock),
            "{policy}: {:?}",
            trace.exit_kind()
        );
    }
}
