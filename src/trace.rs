//! Trace event recording for the simulator.
//!
//! Every driver-visible action (fork, run, block, acquire, release, wake,
//! priority change, exit, idle tick) is recorded as a `TraceEvent` stamped
//! with the tick it happened in.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::SimError;
use crate::types::{Pid, Prio, ResourceId, Tick};

/// A single trace event produced by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub tick: Tick,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceKind {
    /// A process arrived and joined the ready queue.
    Forked { pid: Pid },
    /// The process executed this tick and aged by one.
    Ran { pid: Pid },
    /// The process was dispatched but blocked acquiring `resource`.
    Blocked { pid: Pid, resource: ResourceId },
    Acquired { pid: Pid, resource: ResourceId },
    Released { pid: Pid, resource: ResourceId },
    /// A waiter of `resource` became ready after its release.
    Woke { pid: Pid, resource: ResourceId },
    /// Priority inherited or restored.
    PrioChanged { pid: Pid, from: Prio, to: Prio },
    /// A finished process was removed.
    Exited { pid: Pid },
    /// No process was runnable.
    Idle,
}

/// How a simulation ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExitKind {
    /// The run has not finished yet.
    #[default]
    Running,
    /// Every process ran to completion.
    Completed,
    /// Live processes remain but all of them wait on resources and no
    /// process is left to arrive.
    Deadlock,
    /// `max_ticks` elapsed first.
    TickLimit,
    /// A scheduler or protocol call broke its contract.
    Fatal(SimError),
}

/// A complete simulation trace, containing all events in tick order.
#[derive(Debug, Clone)]
pub struct Trace {
    policy: &'static str,
    events: Vec<TraceEvent>,
    end_tick: Tick,
    exit_kind: ExitKind,
}

impl Trace {
    pub(crate) fn new(policy: &'static str) -> Self {
        Self {
            policy,
            events: Vec::new(),
            end_tick: 0,
            exit_kind: ExitKind::Running,
        }
    }

    pub(crate) fn record(&mut self, tick: Tick, kind: TraceKind) {
        self.events.push(TraceEvent { tick, kind });
    }

    pub(crate) fn finish(&mut self, end_tick: Tick, exit_kind: ExitKind) {
        self.end_tick = end_tick;
        self.exit_kind = exit_kind;
    }

    /// Name of the policy that produced the trace.
    pub fn policy(&self) -> &'static str {
        self.policy
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Tick at which the simulation stopped.
    pub fn end_tick(&self) -> Tick {
        self.end_tick
    }

    pub fn exit_kind(&self) -> &ExitKind {
        &self.exit_kind
    }

    /// Whether the run ended in anything but completion.
    pub fn has_error(&self) -> bool {
        !matches!(self.exit_kind, ExitKind::Completed)
    }

    /// For every tick, the process the scheduler dispatched (whether it
    /// ran or blocked), or `None` for idle ticks.
    pub fn dispatch_sequence(&self) -> Vec<Option<Pid>> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                TraceKind::Ran { pid } | TraceKind::Blocked { pid, .. } => Some(Some(pid)),
                TraceKind::Idle => Some(None),
                _ => None,
            })
            .collect()
    }

    /// Processes that actually executed, one entry per tick.
    pub fn run_sequence(&self) -> Vec<Pid> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                TraceKind::Ran { pid } => Some(pid),
                _ => None,
            })
            .collect()
    }

    /// Ticks a process executed.
    pub fn run_count(&self, pid: Pid) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::Ran { pid: p } if p == pid))
            .count()
    }

    /// Ticks a process was dispatched but blocked.
    pub fn blocked_count(&self, pid: Pid) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::Blocked { pid: p, .. } if p == pid))
            .count()
    }

    pub fn idle_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::Idle))
            .count()
    }

    pub fn fork_tick(&self, pid: Pid) -> Option<Tick> {
        self.events.iter().find_map(|e| match e.kind {
            TraceKind::Forked { pid: p } if p == pid => Some(e.tick),
            _ => None,
        })
    }

    pub fn first_run_tick(&self, pid: Pid) -> Option<Tick> {
        self.events.iter().find_map(|e| match e.kind {
            TraceKind::Ran { pid: p } if p == pid => Some(e.tick),
            _ => None,
        })
    }

    /// Tick by which the process had executed its whole lifespan: one past
    /// its last executed tick. `None` if it never exited.
    pub fn completion_tick(&self, pid: Pid) -> Option<Tick> {
        self.exit_tick(pid)?;
        self.events.iter().rev().find_map(|e| match e.kind {
            TraceKind::Ran { pid: p } if p == pid => Some(e.tick + 1),
            _ => None,
        })
    }

    /// Tick at which the driver removed the finished process.
    pub fn exit_tick(&self, pid: Pid) -> Option<Tick> {
        self.events.iter().find_map(|e| match e.kind {
            TraceKind::Exited { pid: p } if p == pid => Some(e.tick),
            _ => None,
        })
    }

    /// Every pid that appears in the trace, in pid order.
    pub fn pids(&self) -> Vec<Pid> {
        let pids: BTreeSet<Pid> = self
            .events
            .iter()
            .filter_map(|e| match e.kind {
                TraceKind::Forked { pid } => Some(pid),
                _ => None,
            })
            .collect();
        pids.into_iter().collect()
    }

    /// Priority changes of one process, as `(tick, from, to)`.
    pub fn prio_changes(&self, pid: Pid) -> Vec<(Tick, Prio, Prio)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                TraceKind::PrioChanged { pid: p, from, to } if p == pid => Some((e.tick, from, to)),
                _ => None,
            })
            .collect()
    }

    /// One row per process, one column per tick:
    /// `#` ran, `=` dispatched but blocked, `.` alive but not dispatched.
    pub fn timeline(&self) -> String {
        Timeline(self).to_string()
    }

    /// Pretty-print the trace for debugging.
    pub fn dump(&self) {
        for event in &self.events {
            let desc = match &event.kind {
                TraceKind::Forked { pid } => format!("FORK     pid={pid}"),
                TraceKind::Ran { pid } => format!("RUN      pid={pid}"),
                TraceKind::Blocked { pid, resource } => {
                    format!("BLOCK    pid={pid} resource={resource}")
                }
                TraceKind::Acquired { pid, resource } => {
                    format!("ACQUIRE  pid={pid} resource={resource}")
                }
                TraceKind::Released { pid, resource } => {
                    format!("RELEASE  pid={pid} resource={resource}")
                }
                TraceKind::Woke { pid, resource } => {
                    format!("WAKE     pid={pid} resource={resource}")
                }
                TraceKind::PrioChanged { pid, from, to } => {
                    format!("PRIO     pid={pid} {from} -> {to}")
                }
                TraceKind::Exited { pid } => format!("EXIT     pid={pid}"),
                TraceKind::Idle => "IDLE".to_string(),
            };
            eprintln!("[{:>6}] {}", event.tick, desc);
        }
        eprintln!("[{:>6}] END      {:?}", self.end_tick, self.exit_kind);
    }
}

struct Timeline<'a>(&'a Trace);

impl fmt::Display for Timeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trace = self.0;
        let width = trace.end_tick as usize;
        for pid in trace.pids() {
            let mut row = vec![' '; width];
            let alive_from = trace.fork_tick(pid).unwrap_or(0) as usize;
            let alive_to = trace
                .exit_tick(pid)
                .map_or(width, |t| (t as usize).min(width));
            for cell in row.iter_mut().take(alive_to).skip(alive_from) {
                *cell = '.';
            }
            for e in &trace.events {
                let Some(cell) = row.get_mut(e.tick as usize) else {
                    continue;
                };
                match e.kind {
                    TraceKind::Ran { pid: p } if p == pid => *cell = '#',
                    TraceKind::Blocked { pid: p, .. } if p == pid => *cell = '=',
                    _ => {}
                }
            }
            let row: String = row.into_iter().collect();
            writeln!(f, "{:>5} |{}|", pid.0, row.trim_end())?;
        }
        Ok(())
    }
}
