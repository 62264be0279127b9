//! Error types for the scheduling core.
//!
//! Every variant is a broken caller contract. Resource contention and an
//! idle system are not errors: `acquire` reports contention as `Ok(false)`
//! and `schedule` reports idleness as `None`.

use std::fmt;

use crate::process::ProcessStatus;
use crate::types::{Pid, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Resource index outside `[0, NR_RESOURCES)`.
    InvalidResource(u32),
    /// `acquire`/`release` was called with no current process.
    NoCurrentProcess,
    /// A pid that is not (or no longer) in the process arena.
    UnknownProcess(Pid),
    /// `release` was called by a process that does not own the resource.
    NotOwner {
        resource: ResourceId,
        owner: Option<Pid>,
        caller: Pid,
    },
    /// `acquire` was called by the process that already owns the resource.
    AlreadyOwner { resource: ResourceId, pid: Pid },
    /// A process taken off a wait queue was not in `Wait` status.
    WaiterNotWaiting { pid: Pid, status: ProcessStatus },
    /// A structural invariant of the context was found broken.
    Invariant(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidResource(raw) => write!(f, "invalid resource id {raw}"),
            SimError::NoCurrentProcess => write!(f, "no current process"),
            SimError::UnknownProcess(pid) => write!(f, "unknown process pid={pid}"),
            SimError::NotOwner {
                resource,
                owner: Some(owner),
                caller,
            } => write!(
                f,
                "pid={caller} released resource {resource} owned by pid={owner}"
            ),
            SimError::NotOwner {
                resource,
                owner: None,
                caller,
            } => write!(f, "pid={caller} released free resource {resource}"),
            SimError::AlreadyOwner { resource, pid } => {
                write!(f, "pid={pid} already owns resource {resource}")
            }
            SimError::WaiterNotWaiting { pid, status } => {
                write!(f, "waiter pid={pid} is {status:?}, expected Wait")
            }
            SimError::Invariant(msg) => write!(f, "invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for SimError {}
