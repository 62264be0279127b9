use std::io::Write;
use std::path::PathBuf;

use sched_sim::*;

mod common;

fn demo(name: &str) -> Workload {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "demos", name].iter().collect();
    let json = std::fs::read_to_string(&path).unwrap();
    load_workload(&json).unwrap()
}

#[test]
fn test_workload_from_file() {
    common::setup_test();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "policy": "sjf",
            "processes": [
                {{ "name": "long", "lifespan": 3 }},
                {{ "name": "short", "arrival": 1, "lifespan": 1 }},
                {{ "name": "shorter", "arrival": 1, "lifespan": 1, "prio": 7 }}
            ]
        }}"#
    )
    .unwrap();
    file.flush().unwrap();

    let json = std::fs::read_to_string(file.path()).unwrap();
    let workload = load_workload(&json).unwrap();
    assert_eq!(workload.policy, Some(Policy::Sjf));
    assert_eq!(workload.scenario.processes[2].name, "shorter");

    let trace = common::run_to_completion(Policy::Sjf, workload.scenario);
    assert_eq!(trace.run_sequence(), vec![Pid(0), Pid(0), Pid(0), Pid(1), Pid(2)]);
}

#[test]
fn test_demo_inversion() {
    common::setup_test();
    let workload = demo("inversion.json");
    let policy = workload.policy.unwrap();
    assert_eq!(policy, Policy::Pip);
    assert_eq!(workload.scenario.max_ticks, 200);

    let plain = common::run_to_completion(Policy::Prio, workload.scenario.clone());
    let pip = common::run_to_completion(policy, workload.scenario);

    assert_eq!(plain.completion_tick(Pid(1)), Some(12));
    assert_eq!(pip.completion_tick(Pid(1)), Some(9));

    let stats = TraceStats::from_trace(&pip);
    let high = stats.get(Pid(1)).unwrap();
    assert_eq!(high.turnaround(), Some(7));
    assert_eq!(high.response(), Some(4));
    assert_eq!(high.blocked_ticks, 1);
    assert_eq!(stats.idle_ticks, 0);
    assert_eq!(stats.utilization_percent(), 12.0 * 100.0 / 13.0);
}

#[test]
fn test_demo_deadlock() {
    common::setup_test();
    let workload = demo("deadlock.json");
    let trace = Simulator::new(workload.policy.unwrap()).run(workload.scenario);

    assert_eq!(trace.exit_kind(), &ExitKind::Deadlock);
}

#[test]
fn test_demo_mixed_all_policies() {
    common::setup_test();
    let workload = demo("mixed.json");
    assert_eq!(workload.policy, None);

    for policy in Policy::ALL {
        let trace = Simulator::new(policy).run(workload.scenario.clone());
        assert!(
            matches!(trace.exit_kind(), ExitKind::Completed | ExitKind::Deadlock),
            "{policy}: {:?}",
            trace.exit_kind()
        );
        let timeline = trace.timeline();
        assert_eq!(timeline.lines().count(), 4, "{policy}:\n{timeline}");
    }
}

#[test]
fn test_timeline_rendering() {
    common::setup_test();
    let scenario = Scenario::builder()
        .add_process("owner", 0, 4, 0)
        .hold(common::rid(0), 0, 3)
        .add_process("requester", 0, 2, 0)
        .hold(common::rid(0), 0, 1)
        .build();

    let trace = common::run_to_completion(Policy::Rr, scenario);

    assert_eq!(
        trace.timeline(),
        "    0 |#.##.#|\n    1 |.=..#.#|\n"
    );
}
