#![allow(dead_code)]

use sched_sim::{
    ExitKind, Monitor, Pid, Policy, ProbeContext, ProbePoint, ResourceId, Scenario, SimFormat,
    Simulator, Tick, Trace,
};

/// Initialize tracing from `RUST_LOG`.
///
/// `try_init()` is idempotent: first call in the process succeeds,
/// subsequent calls are silently ignored.
pub fn setup_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .event_format(SimFormat)
        .with_test_writer()
        .try_init();
}

pub fn rid(raw: u32) -> ResourceId {
    ResourceId::new(raw).unwrap()
}

/// Run `scenario` under `policy`, dump the trace, and require completion.
pub fn run_to_completion(policy: Policy, scenario: Scenario) -> Trace {
    let trace = Simulator::new(policy).run(scenario);
    trace.dump();
    assert_eq!(
        trace.exit_kind(),
        &ExitKind::Completed,
        "{policy} did not complete"
    );
    trace
}

/// Monitor that runs a check against the context at every probe point and
/// records the first failure.
pub struct InvariantMonitor {
    pub samples: usize,
    pub violation: Option<String>,
}

impl InvariantMonitor {
    pub fn new() -> Self {
        InvariantMonitor {
            samples: 0,
            violation: None,
        }
    }
}

impl Monitor for InvariantMonitor {
    fn sample(&mut self, ctx: &ProbeContext) {
        self.samples += 1;
        if self.violation.is_some() {
            return;
        }
        if let Err(e) = ctx.sched.check_invariants() {
            self.violation = Some(format!("tick {} {:?}: {e}", ctx.tick, ctx.point));
            return;
        }
        // At most one owner per resource, and never two resources' wait
        // queues holding the same pid.
        let mut seen = std::collections::BTreeSet::new();
        for (id, r) in ctx.sched.resources.iter() {
            for pid in r.waitqueue.iter() {
                if !seen.insert(pid) {
                    self.violation = Some(format!(
                        "tick {}: pid={pid} waits on resource {id} and another",
                        ctx.tick
                    ));
                    return;
                }
            }
        }
    }
}

/// Monitor recording, for every executed tick, the ready processes the
/// scheduler chose from and the one it picked.
pub struct DispatchMonitor {
    pub dispatches: Vec<Dispatch>,
}

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub tick: Tick,
    pub pid: Pid,
    /// `(pid, remaining, prio, prio_orig)` of every ready process, after
    /// the pick.
    pub ready: Vec<(Pid, Tick, u32, u32)>,
    /// `(remaining, prio, prio_orig)` of the picked process.
    pub picked: (Tick, u32, u32),
}

impl DispatchMonitor {
    pub fn new() -> Self {
        DispatchMonitor {
            dispatches: Vec::new(),
        }
    }

    pub fn sequence(&self) -> Vec<Pid> {
        self.dispatches.iter().map(|d| d.pid).collect()
    }
}

impl Monitor for DispatchMonitor {
    fn sample(&mut self, ctx: &ProbeContext) {
        if ctx.point != ProbePoint::Scheduled {
            return;
        }
        let Some(pid) = ctx.pid else {
            return;
        };
        let Ok(p) = ctx.sched.process(pid) else {
            return;
        };
        let ready = ctx
            .sched
            .ready
            .iter()
            .filter_map(|r| ctx.sched.process(r).ok())
            .map(|r| (r.pid, r.remaining(), r.prio, r.prio_orig))
            .collect();
        self.dispatches.push(Dispatch {
            tick: ctx.tick,
            pid,
            ready,
            picked: (p.remaining(), p.prio, p.prio_orig),
        });
    }
}
