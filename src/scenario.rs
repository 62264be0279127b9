//! Scenario definition and builder API.

use std::collections::HashSet;
use std::fmt;

use crate::process::{ProcessDef, ResourceRequest};
use crate::types::{Pid, Prio, ResourceId, Tick};

/// Default cap on simulated ticks.
pub const DEFAULT_MAX_TICKS: Tick = 100_000;

/// A complete simulation scenario: the processes and the run bounds.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub processes: Vec<ProcessDef>,
    /// The run stops with `ExitKind::TickLimit` once this many ticks passed.
    pub max_ticks: Tick,
    /// Check `SchedContext::check_invariants` at the end of every tick.
    pub check_invariants: bool,
}

/// Why a scenario was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    NoProcesses,
    ZeroMaxTicks,
    DuplicatePid(Pid),
    ZeroLifespan(Pid),
    ZeroDuration { pid: Pid, resource: ResourceId },
    /// A hold ends after the process's lifespan, so it could never be released.
    HoldPastLifespan { pid: Pid, resource: ResourceId },
    /// Two holds of the same resource by one process overlap.
    OverlappingHold { pid: Pid, resource: ResourceId },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::NoProcesses => write!(f, "scenario must have at least one process"),
            ScenarioError::ZeroMaxTicks => write!(f, "max_ticks must be positive"),
            ScenarioError::DuplicatePid(pid) => write!(f, "duplicate pid {pid}"),
            ScenarioError::ZeroLifespan(pid) => write!(f, "pid {pid} has zero lifespan"),
            ScenarioError::ZeroDuration { pid, resource } => {
                write!(f, "pid {pid} holds resource {resource} for zero ticks")
            }
            ScenarioError::HoldPastLifespan { pid, resource } => {
                write!(f, "pid {pid} holds resource {resource} past its lifespan")
            }
            ScenarioError::OverlappingHold { pid, resource } => {
                write!(f, "pid {pid} has overlapping holds of resource {resource}")
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder {
            processes: Vec::new(),
            max_ticks: DEFAULT_MAX_TICKS,
            check_invariants: true,
            next_pid: Pid(0),
        }
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.processes.is_empty() {
            return Err(ScenarioError::NoProcesses);
        }
        if self.max_ticks == 0 {
            return Err(ScenarioError::ZeroMaxTicks);
        }
        let mut seen = HashSet::new();
        for def in &self.processes {
            if !seen.insert(def.pid) {
                return Err(ScenarioError::DuplicatePid(def.pid));
            }
            validate_process(def)?;
        }
        Ok(())
    }
}

fn validate_process(def: &ProcessDef) -> Result<(), ScenarioError> {
    let pid = def.pid;
    if def.lifespan == 0 {
        return Err(ScenarioError::ZeroLifespan(pid));
    }
    for r in &def.resources {
        let resource = r.resource;
        if r.duration == 0 {
            return Err(ScenarioError::ZeroDuration { pid, resource });
        }
        let ends_in_time = r
            .at
            .checked_add(r.duration)
            .is_some_and(|end| end <= def.lifespan);
        if !ends_in_time {
            return Err(ScenarioError::HoldPastLifespan { pid, resource });
        }
    }
    // Every hold ends within the lifespan from here on, so `release_at`
    // is exact.
    for (i, r) in def.resources.iter().enumerate() {
        let resource = r.resource;
        let overlaps = def.resources[i + 1..]
            .iter()
            .filter(|o| o.resource == resource)
            .any(|o| o.at < r.release_at() && r.at < o.release_at());
        if overlaps {
            return Err(ScenarioError::OverlappingHold { pid, resource });
        }
    }
    Ok(())
}

/// Builder for constructing scenarios.
pub struct ScenarioBuilder {
    processes: Vec<ProcessDef>,
    max_ticks: Tick,
    check_invariants: bool,
    next_pid: Pid,
}

impl ScenarioBuilder {
    /// Add a process with a full ProcessDef.
    pub fn process(mut self, def: ProcessDef) -> Self {
        self.next_pid = Pid(self.next_pid.0.max(def.pid.0.saturating_add(1)));
        self.processes.push(def);
        self
    }

    /// Convenience: add a process with an auto-assigned pid.
    pub fn add_process(mut self, name: &str, arrival: Tick, lifespan: Tick, prio: Prio) -> Self {
        let pid = self.next_pid;
        self.next_pid = Pid(pid.0.saturating_add(1));
        self.processes.push(ProcessDef {
            name: name.to_string(),
            pid,
            arrival,
            lifespan,
            prio,
            resources: Vec::new(),
        });
        self
    }

    /// Give the most recently added process a hold of `resource` from age
    /// `at` for `duration` ticks.
    ///
    /// # Panics
    /// Panics if no process was added yet.
    pub fn hold(mut self, resource: ResourceId, at: Tick, duration: Tick) -> Self {
        let last = self
            .processes
            .last_mut()
            .expect("hold() needs a process to attach to");
        last.resources
            .push(ResourceRequest::new(resource, at, duration));
        self
    }

    pub fn max_ticks(mut self, ticks: Tick) -> Self {
        self.max_ticks = ticks;
        self
    }

    /// Skip the per-tick structural invariant check.
    pub fn no_invariant_checks(mut self) -> Self {
        self.check_invariants = false;
        self
    }

    /// Build the scenario.
    ///
    /// # Panics
    /// Panics if the scenario fails [`Scenario::validate`].
    pub fn build(self) -> Scenario {
        let scenario = Scenario {
            processes: self.processes,
            max_ticks: self.max_ticks,
            check_invariants: self.check_invariants,
        };
        if let Err(e) = scenario.validate() {
            panic!("invalid scenario: {e}");
        }
        scenario
    }
}
