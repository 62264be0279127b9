//! Parser for JSON workload descriptions.
//!
//! A workload file declares the processes of a [`Scenario`] and,
//! optionally, the policy to run it under:
//!
//! ```json
//! {
//!   "policy": "pip",
//!   "max_ticks": 200,
//!   "processes": [
//!     { "name": "low", "arrival": 0, "lifespan": 6, "prio": 1,
//!       "resources": [ { "id": 3, "at": 1, "duration": 4 } ] },
//!     { "name": "high", "arrival": 2, "lifespan": 3, "prio": 5,
//!       "resources": [ { "id": 3, "at": 0, "duration": 1 } ] }
//!   ]
//! }
//! ```
//!
//! `pid` may be omitted; missing pids are assigned in file order from the
//! smallest id not claimed explicitly. `name` defaults to `p<pid>`,
//! `arrival` and `prio` to 0.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::process::{ProcessDef, ResourceRequest};
use crate::scenario::{Scenario, ScenarioError, DEFAULT_MAX_TICKS};
use crate::sched::Policy;
use crate::types::{Pid, Prio, ResourceId, Tick};

/// Errors from parsing a workload.
#[derive(Debug)]
pub enum WorkloadError {
    /// JSON parse error.
    Json(serde_json::Error),
    /// Resource id outside the resource table.
    InvalidResource { process: String, id: u32 },
    /// The resulting scenario is inconsistent.
    Invalid(ScenarioError),
}

impl std::fmt::Display for WorkloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadError::Json(e) => write!(f, "JSON parse error: {e}"),
            WorkloadError::InvalidResource { process, id } => {
                write!(f, "process {process:?}: invalid resource id {id}")
            }
            WorkloadError::Invalid(e) => write!(f, "invalid workload: {e}"),
        }
    }
}

impl std::error::Error for WorkloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkloadError::Json(e) => Some(e),
            WorkloadError::Invalid(e) => Some(e),
            WorkloadError::InvalidResource { .. } => None,
        }
    }
}

impl From<serde_json::Error> for WorkloadError {
    fn from(e: serde_json::Error) -> Self {
        WorkloadError::Json(e)
    }
}

impl From<ScenarioError> for WorkloadError {
    fn from(e: ScenarioError) -> Self {
        WorkloadError::Invalid(e)
    }
}

/// A parsed workload.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Policy requested by the file, if any.
    pub policy: Option<Policy>,
    pub scenario: Scenario,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkloadFile {
    #[serde(default)]
    policy: Option<Policy>,
    #[serde(default)]
    max_ticks: Option<Tick>,
    processes: Vec<ProcessEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcessEntry {
    #[serde(default)]
    pid: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arrival: Tick,
    lifespan: Tick,
    #[serde(default)]
    prio: Prio,
    #[serde(default)]
    resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceEntry {
    id: u32,
    at: Tick,
    duration: Tick,
}

/// Parse a JSON workload into a validated scenario.
pub fn load_workload(json: &str) -> Result<Workload, WorkloadError> {
    let file: WorkloadFile = serde_json::from_str(json)?;

    let claimed: BTreeSet<u32> = file.processes.iter().filter_map(|p| p.pid).collect();
    let mut next_free = 0u32;
    let mut processes = Vec::with_capacity(file.processes.len());

    for entry in file.processes {
        let pid = match entry.pid {
            Some(pid) => pid,
            None => {
                while claimed.contains(&next_free) {
                    next_free += 1;
                }
                next_free += 1;
                next_free - 1
            }
        };
        let name = entry.name.unwrap_or_else(|| format!("p{pid}"));

        let mut resources = Vec::with_capacity(entry.resources.len());
        for r in entry.resources {
            let resource = ResourceId::new(r.id).map_err(|_| WorkloadError::InvalidResource {
                process: name.clone(),
                id: r.id,
            })?;
            resources.push(ResourceRequest::new(resource, r.at, r.duration));
        }

        processes.push(ProcessDef {
            name,
            pid: Pid(pid),
            arrival: entry.arrival,
            lifespan: entry.lifespan,
            prio: entry.prio,
            resources,
        });
    }

    let scenario = Scenario {
        processes,
        max_ticks: file.max_ticks.unwrap_or(DEFAULT_MAX_TICKS),
        check_invariants: true,
    };
    scenario.validate()?;

    Ok(Workload {
        policy: file.policy,
        scenario,
    })
}
