//! Tick-driven simulation engine.
//!
//! The engine plays the part of the machine around the scheduler: it forks
//! processes at their arrival tick, asks the scheduler who runs, replays the
//! running process's resource timeline through `acquire`/`release`, ages
//! it, and exits it once it has run for its whole lifespan.

use std::cell::Cell;
use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::context::SchedContext;
use crate::error::SimError;
use crate::monitor::{Monitor, ProbeContext, ProbePoint};
use crate::process::{ProcessDef, ProcessStatus};
use crate::scenario::Scenario;
use crate::sched::Scheduler;
use crate::trace::{ExitKind, Trace, TraceKind};
use crate::types::{Pid, Prio, Tick};

thread_local! {
    static SIM_TICK: Cell<Option<Tick>> = const { Cell::new(None) };
}

/// Tick of the simulation running on this thread, for log formatting.
pub fn sim_tick() -> Option<Tick> {
    SIM_TICK.with(|t| t.get())
}

fn set_sim_tick(tick: Option<Tick>) {
    SIM_TICK.with(|t| t.set(tick));
}

/// The main simulator.
pub struct Simulator<S: Scheduler> {
    scheduler: S,
    dump_status: bool,
}

impl<S: Scheduler> Simulator<S> {
    pub fn new(scheduler: S) -> Self {
        Simulator {
            scheduler,
            dump_status: false,
        }
    }

    /// Log `SchedContext::dump_status()` after every schedule decision.
    pub fn dump_status(mut self, enabled: bool) -> Self {
        self.dump_status = enabled;
        self
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Run a scenario and return the trace.
    pub fn run(&mut self, scenario: Scenario) -> Trace {
        self.run_inner(scenario, None)
    }

    /// Run a scenario, sampling `monitor` at every probe point.
    pub fn run_with_monitor(&mut self, scenario: Scenario, monitor: &mut dyn Monitor) -> Trace {
        self.run_inner(scenario, Some(monitor))
    }

    fn run_inner(&mut self, scenario: Scenario, mut monitor: Option<&mut dyn Monitor>) -> Trace {
        let mut ctx = SchedContext::new();
        let mut trace = Trace::new(self.scheduler.name());

        let mut arrivals: Vec<ProcessDef> = scenario.processes;
        arrivals.sort_by_key(|d| d.arrival);
        let mut arrivals: VecDeque<ProcessDef> = arrivals.into();

        set_sim_tick(Some(0));
        info!(
            policy = self.scheduler.name(),
            processes = arrivals.len(),
            "simulation start"
        );

        if let Err(e) = self.scheduler.initialize(&mut ctx) {
            trace.finish(0, ExitKind::Fatal(e));
            set_sim_tick(None);
            return trace;
        }

        let exit = 'sim: loop {
            let tick = ctx.ticks;
            set_sim_tick(Some(tick));
            if tick >= scenario.max_ticks {
                warn!(max_ticks = scenario.max_ticks, "tick limit reached");
                break ExitKind::TickLimit;
            }

            while arrivals.front().is_some_and(|d| d.arrival <= tick) {
                let Some(def) = arrivals.pop_front() else {
                    break;
                };
                match ctx.fork(&def) {
                    Ok(pid) => {
                        info!(pid = pid.0, lifespan = def.lifespan, prio = def.prio, "fork");
                        trace.record(tick, TraceKind::Forked { pid });
                        self.scheduler.forked(&mut ctx, pid);
                    }
                    Err(e) => break 'sim ExitKind::Fatal(e),
                }
            }

            let prev = ctx.current;
            let next = self.scheduler.schedule(&mut ctx);

            if let Some(prev) = prev.filter(|&p| Some(p) != next) {
                let finished = ctx.process(prev).is_ok_and(|p| p.is_finished());
                if finished {
                    self.scheduler.exiting(&mut ctx, prev);
                    if let Err(e) = ctx.exit(prev) {
                        break ExitKind::Fatal(e);
                    }
                    info!(pid = prev.0, "exit");
                    trace.record(tick, TraceKind::Exited { pid: prev });
                }
            }
            ctx.current = next;

            if self.dump_status {
                info!("status\n{}", ctx.dump_status());
            }
            if let Some(m) = monitor.as_deref_mut() {
                m.sample(&ProbeContext {
                    point: ProbePoint::Scheduled,
                    tick,
                    pid: next,
                    sched: &ctx,
                    trace: &trace,
                });
            }

            match next {
                None => {
                    if ctx.nr_processes() == 0 && arrivals.is_empty() {
                        break ExitKind::Completed;
                    }
                    let all_waiting = ctx
                        .processes()
                        .all(|p| p.status == ProcessStatus::Wait);
                    if arrivals.is_empty() && ctx.ready.is_empty() && all_waiting {
                        warn!(blocked = ctx.nr_processes(), "deadlock");
                        break ExitKind::Deadlock;
                    }
                    debug!("idle");
                    trace.record(tick, TraceKind::Idle);
                }
                Some(pid) => {
                    if let Err(e) = self.run_current(&mut ctx, &mut trace, pid) {
                        break ExitKind::Fatal(e);
                    }
                }
            }

            if scenario.check_invariants {
                if let Err(e) = ctx.check_invariants() {
                    break ExitKind::Fatal(e);
                }
            }
            if let Some(m) = monitor.as_deref_mut() {
                m.sample(&ProbeContext {
                    point: ProbePoint::TickEnd,
                    tick,
                    pid: next,
                    sched: &ctx,
                    trace: &trace,
                });
            }

            ctx.ticks += 1;
        };

        self.scheduler.finalize(&mut ctx);
        match &exit {
            ExitKind::Fatal(e) => warn!(error = %e, "simulation aborted"),
            kind => info!(exit = ?kind, "simulation end"),
        }
        trace.finish(ctx.ticks, exit);
        set_sim_tick(None);
        trace
    }

    /// Execute one tick of `pid`: take every resource due at its age, and
    /// if none blocks, age it by one and release every hold that ended.
    fn run_current(
        &mut self,
        ctx: &mut SchedContext,
        trace: &mut Trace,
        pid: Pid,
    ) -> Result<(), SimError> {
        let tick = ctx.ticks;
        ctx.process_mut(pid)?.status = ProcessStatus::Running;

        loop {
            let Some(req) = ctx.process(pid)?.due_requests().next().copied() else {
                break;
            };
            let before = prio_snapshot(ctx);
            let acquired = self.scheduler.acquire(ctx, req.resource)?;
            record_prio_changes(ctx, &before, trace);
            if !acquired {
                debug!(pid = pid.0, resource = req.resource.raw(), "blocked");
                trace.record(
                    tick,
                    TraceKind::Blocked {
                        pid,
                        resource: req.resource,
                    },
                );
                return Ok(());
            }
            let p = ctx.process_mut(pid)?;
            if let Some(pos) = p.to_acquire.iter().position(|r| *r == req) {
                let held = p.to_acquire.remove(pos);
                p.holding.push(held);
            }
            trace.record(
                tick,
                TraceKind::Acquired {
                    pid,
                    resource: req.resource,
                },
            );
        }

        let p = ctx.process_mut(pid)?;
        p.age += 1;
        let age = p.age;
        debug!(pid = pid.0, age, lifespan = p.lifespan, "run");
        trace.record(tick, TraceKind::Ran { pid });

        loop {
            let p = ctx.process(pid)?;
            let Some(pos) = p.holding.iter().position(|r| r.release_at() == age) else {
                break;
            };
            let req = p.holding[pos];
            let waiters: Vec<Pid> = ctx.resources.get(req.resource).waitqueue.iter().collect();
            let before = prio_snapshot(ctx);

            self.scheduler.release(ctx, req.resource)?;

            ctx.process_mut(pid)?.holding.remove(pos);
            trace.record(
                tick,
                TraceKind::Released {
                    pid,
                    resource: req.resource,
                },
            );
            record_prio_changes(ctx, &before, trace);
            for w in waiters {
                if ctx.process(w)?.status == ProcessStatus::Ready {
                    trace.record(
                        tick,
                        TraceKind::Woke {
                            pid: w,
                            resource: req.resource,
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

fn prio_snapshot(ctx: &SchedContext) -> Vec<(Pid, Prio)> {
    ctx.processes().map(|p| (p.pid, p.prio)).collect()
}

fn record_prio_changes(ctx: &SchedContext, before: &[(Pid, Prio)], trace: &mut Trace) {
    for &(pid, from) in before {
        if let Ok(p) = ctx.process(pid) {
            if p.prio != from {
                trace.record(
                    ctx.ticks,
                    TraceKind::PrioChanged {
                        pid,
                        from,
                        to: p.prio,
                    },
                );
            }
        }
    }
}
