//! Scheduling policies.
//!
//! A policy is one decision function, "given the current process and the
//! ready queue, who runs this tick", paired with one resource arbitration
//! strategy. [`Scheduler`] is the capability interface the driver calls;
//! [`Policy`] implements it for the six built-in policies.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::context::SchedContext;
use crate::error::SimError;
use crate::process::{Process, ProcessStatus};
use crate::protocol::Arbitration;
use crate::types::{Pid, ResourceId};

mod fifo;
mod prio;
mod rr;
mod sjf;
mod srtf;

/// Operations the driver calls on the active scheduler.
pub trait Scheduler {
    /// Human-readable policy name.
    fn name(&self) -> &'static str;

    /// Called once before the first tick.
    fn initialize(&mut self, _ctx: &mut SchedContext) -> Result<(), SimError> {
        Ok(())
    }

    /// Called once after the last tick.
    fn finalize(&mut self, _ctx: &mut SchedContext) {}

    /// Called right after `pid` was forked onto the ready queue.
    fn forked(&mut self, _ctx: &mut SchedContext, _pid: Pid) {}

    /// Called when a finished `pid` is about to leave the arena. The
    /// process is still live in `ctx`.
    fn exiting(&mut self, _ctx: &mut SchedContext, _pid: Pid) {}

    /// Pick the process to run this tick, or `None` if the system is idle.
    fn schedule(&mut self, ctx: &mut SchedContext) -> Option<Pid>;

    /// Take `resource` for the current process. `Ok(false)` means the
    /// process is now waiting.
    fn acquire(&mut self, ctx: &mut SchedContext, resource: ResourceId) -> Result<bool, SimError>;

    /// Release `resource`, which the current process must own.
    fn release(&mut self, ctx: &mut SchedContext, resource: ResourceId) -> Result<(), SimError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// First in, first out. Runs each process to completion.
    Fifo,
    /// Shortest job first, non-preemptive.
    Sjf,
    /// Shortest remaining time first, preemptive every tick.
    Srtf,
    /// Round-robin with a one-tick quantum.
    #[serde(alias = "round-robin")]
    Rr,
    /// Static priority, preemptive.
    #[serde(alias = "priority")]
    Prio,
    /// Priority with the priority-inheritance protocol.
    Pip,
}

impl Policy {
    pub const ALL: [Policy; 6] = [
        Policy::Fifo,
        Policy::Sjf,
        Policy::Srtf,
        Policy::Rr,
        Policy::Prio,
        Policy::Pip,
    ];

    /// Short identifier used on the command line and in workload files.
    pub fn key(self) -> &'static str {
        match self {
            Policy::Fifo => "fifo",
            Policy::Sjf => "sjf",
            Policy::Srtf => "srtf",
            Policy::Rr => "rr",
            Policy::Prio => "prio",
            Policy::Pip => "pip",
        }
    }

    /// The resource arbitration strategy paired with this policy.
    pub fn arbitration(self) -> Arbitration {
        match self {
            Policy::Fifo | Policy::Sjf | Policy::Srtf | Policy::Rr => Arbitration::Fcfs,
            Policy::Prio => Arbitration::Priority,
            Policy::Pip => Arbitration::Inheritance,
        }
    }
}

impl Scheduler for Policy {
    fn name(&self) -> &'static str {
        match self {
            Policy::Fifo => "FIFO",
            Policy::Sjf => "Shortest-Job First",
            Policy::Srtf => "Shortest Remaining Time First",
            Policy::Rr => "Round-Robin",
            Policy::Prio => "Priority",
            Policy::Pip => "Priority + Priority Inheritance Protocol",
        }
    }

    fn schedule(&mut self, ctx: &mut SchedContext) -> Option<Pid> {
        match self {
            Policy::Fifo => fifo::schedule(ctx),
            Policy::Sjf => sjf::schedule(ctx),
            Policy::Srtf => srtf::schedule(ctx),
            Policy::Rr => rr::schedule(ctx),
            Policy::Prio => prio::schedule(ctx, |p| p.prio_orig),
            Policy::Pip => prio::schedule(ctx, |p| p.prio),
        }
    }

    fn acquire(&mut self, ctx: &mut SchedContext, resource: ResourceId) -> Result<bool, SimError> {
        self.arbitration().acquire(ctx, resource)
    }

    fn release(&mut self, ctx: &mut SchedContext, resource: ResourceId) -> Result<(), SimError> {
        self.arbitration().release(ctx, resource)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" | "fcfs" => Ok(Policy::Fifo),
            "sjf" => Ok(Policy::Sjf),
            "srtf" => Ok(Policy::Srtf),
            "rr" | "round-robin" => Ok(Policy::Rr),
            "prio" | "priority" => Ok(Policy::Prio),
            "pip" => Ok(Policy::Pip),
            other => Err(format!(
                "unknown policy {other:?}; expected one of fifo, sjf, srtf, rr, prio, pip"
            )),
        }
    }
}

/// The current process if it may keep competing for the CPU: it exists,
/// is not blocked, and has ticks left.
fn runnable_current(ctx: &SchedContext) -> Option<&Process> {
    ctx.current_process()
        .filter(|p| p.status != ProcessStatus::Wait && !p.is_finished())
}

/// Detach and return the ready-queue head.
fn pick_head(ctx: &mut SchedContext) -> Option<Pid> {
    ctx.ready.pop_front()
}
