//! Monitor trait for mid-simulation state sampling.
//!
//! Monitors are called by the engine at fixed points of every tick so
//! tests and tools can inspect the scheduling context while it evolves.

use crate::context::SchedContext;
use crate::trace::Trace;
use crate::types::{Pid, Tick};

/// Points in a tick where monitors are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePoint {
    /// After `schedule()` returned and before the chosen process runs.
    /// The ready queue is exactly what the scheduler chose from.
    Scheduled,
    /// After the tick's acquire/run/release work, before the tick advances.
    TickEnd,
}

/// Context passed to monitors at each probe point.
pub struct ProbeContext<'a> {
    pub point: ProbePoint,
    pub tick: Tick,
    /// Process chosen for this tick, if any.
    pub pid: Option<Pid>,
    /// Read-only view of the scheduling context.
    pub sched: &'a SchedContext,
    /// The trace accumulated so far.
    pub trace: &'a Trace,
}

pub trait Monitor {
    fn sample(&mut self, ctx: &ProbeContext);
}
