//! Lifecycle callbacks a scheduler receives from the engine.

use sched_sim::*;

mod common;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Hook {
    Initialize,
    Forked { tick: Tick, pid: Pid, queued: bool },
    Exiting { tick: Tick, pid: Pid, age: Tick },
    Finalize,
}

/// Round-robin that records every lifecycle callback.
struct Recorder {
    hooks: Vec<Hook>,
}

impl Scheduler for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn initialize(&mut self, _ctx: &mut SchedContext) -> Result<(), SimError> {
        self.hooks.push(Hook::Initialize);
        Ok(())
    }

    fn finalize(&mut self, _ctx: &mut SchedContext) {
        self.hooks.push(Hook::Finalize);
    }

    fn forked(&mut self, ctx: &mut SchedContext, pid: Pid) {
        self.hooks.push(Hook::Forked {
            tick: ctx.ticks,
            pid,
            queued: ctx.ready.contains(pid),
        });
    }

    fn exiting(&mut self, ctx: &mut SchedContext, pid: Pid) {
        let age = ctx.process(pid).map(|p| p.age).unwrap_or_default();
        self.hooks.push(Hook::Exiting {
            tick: ctx.ticks,
            pid,
            age,
        });
    }

    fn schedule(&mut self, ctx: &mut SchedContext) -> Option<Pid> {
        Policy::Rr.schedule(ctx)
    }

    fn acquire(&mut self, ctx: &mut SchedContext, resource: ResourceId) -> Result<bool, SimError> {
        Policy::Rr.acquire(ctx, resource)
    }

    fn release(&mut self, ctx: &mut SchedContext, resource: ResourceId) -> Result<(), SimError> {
        Policy::Rr.release(ctx, resource)
    }
}

#[test]
fn test_lifecycle_hooks_order() {
    common::setup_test();
    let scenario = Scenario::builder()
        .add_process("p1", 0, 3, 0)
        .add_process("p2", 1, 1, 0)
        .build();

    let mut sim = Simulator::new(Recorder { hooks: Vec::new() });
    let trace = sim.run(scenario);
    assert_eq!(trace.exit_kind(), &ExitKind::Completed);

    // p1 runs at 0, p2 at 1, p1 at 2 and 3. p2 exits when p1 replaces it
    // at tick 2; p1 exits on the idle pick at tick 4.
    assert_eq!(
        sim.scheduler().hooks,
        vec![
            Hook::Initialize,
            Hook::Forked {
                tick: 0,
                pid: Pid(0),
                queued: true
            },
            Hook::Forked {
                tick: 1,
                pid: Pid(1),
                queued: true
            },
            Hook::Exiting {
                tick: 2,
                pid: Pid(1),
                age: 1
            },
            Hook::Exiting {
                tick: 4,
                pid: Pid(0),
                age: 3
            },
            Hook::Finalize,
        ]
    );
}

#[test]
fn test_default_hooks_are_noops() {
    common::setup_test();
    let scenario = Scenario::builder().add_process("solo", 0, 2, 0).build();

    let mut ctx = SchedContext::new();
    let mut policy = Policy::Fifo;
    policy.forked(&mut ctx, Pid(0));
    policy.exiting(&mut ctx, Pid(0));
    assert_eq!(ctx.nr_processes(), 0);

    let trace = common::run_to_completion(policy, scenario);
    assert_eq!(trace.run_count(Pid(0)), 2);
}
