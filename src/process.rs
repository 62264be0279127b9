//! Process model for the simulator.
//!
//! A `ProcessDef` is what a scenario declares; a `Process` is the runtime
//! record held in the context's arena from fork until exit.

use crate::types::{Pid, Prio, ResourceId, Tick};

/// The state a simulated process can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Runnable, sitting in the ready queue.
    Ready,
    /// Dispatched for the current tick.
    Running,
    /// Blocked on a resource wait queue.
    Wait,
    /// Ran for its whole lifespan.
    Exited,
}

/// One entry of a process's resource timeline.
///
/// The process acquires `resource` when its age equals `at` and releases
/// it once its age reaches `at + duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRequest {
    pub resource: ResourceId,
    pub at: Tick,
    pub duration: Tick,
}

impl ResourceRequest {
    pub fn new(resource: ResourceId, at: Tick, duration: Tick) -> Self {
        ResourceRequest {
            resource,
            at,
            duration,
        }
    }

    /// Age at which the hold ends, saturating at `Tick::MAX`.
    pub fn release_at(&self) -> Tick {
        self.at.saturating_add(self.duration)
    }
}

/// Definition of a process for scenario creation.
#[derive(Debug, Clone)]
pub struct ProcessDef {
    pub name: String,
    pub pid: Pid,
    /// Tick at which the process is forked onto the ready queue.
    pub arrival: Tick,
    pub lifespan: Tick,
    pub prio: Prio,
    pub resources: Vec<ResourceRequest>,
}

/// A simulated process at runtime.
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub arrival: Tick,
    /// Ticks executed so far.
    pub age: Tick,
    /// Ticks required to finish.
    pub lifespan: Tick,
    /// Current priority, possibly boosted by inheritance.
    pub prio: Prio,
    /// Baseline priority.
    pub prio_orig: Prio,
    pub status: ProcessStatus,
    /// Requests not yet acquired, in timeline order.
    pub to_acquire: Vec<ResourceRequest>,
    /// Requests acquired and not yet released.
    pub holding: Vec<ResourceRequest>,
}

impl Process {
    pub fn new(def: &ProcessDef) -> Self {
        let mut to_acquire = def.resources.clone();
        // Stable: requests sharing an `at` keep their declared order.
        to_acquire.sort_by_key(|r| r.at);
        Process {
            pid: def.pid,
            name: def.name.clone(),
            arrival: def.arrival,
            age: 0,
            lifespan: def.lifespan,
            prio: def.prio,
            prio_orig: def.prio,
            status: ProcessStatus::Ready,
            to_acquire,
            holding: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.age >= self.lifespan
    }

    /// Ticks left until the process finishes.
    pub fn remaining(&self) -> Tick {
        self.lifespan.saturating_sub(self.age)
    }

    /// Requests due at the current age, in acquisition order.
    pub fn due_requests(&self) -> impl Iterator<Item = &ResourceRequest> {
        let age = self.age;
        self.to_acquire.iter().filter(move |r| r.at == age)
    }
}
