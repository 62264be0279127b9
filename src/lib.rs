//! sched_sim - Discrete-time simulator for CPU scheduling policies.
//!
//! Processes arrive at scripted ticks, run for a fixed lifespan and, at
//! scripted ages, hold mutual-exclusion resources for a number of ticks.
//! One uniprocessor runs one process per tick. A pluggable scheduling
//! policy picks that process; a resource arbitration protocol decides who
//! waits and who is woken when a resource is released.
//!
//! # Architecture
//!
//! - **Engine**: Tick loop that forks, schedules, acquires, ages, releases
//!   and exits processes
//! - **Context**: Process arena, ready queue, resource table, current process
//! - **Policies**: FIFO, SJF, SRTF, round-robin, priority, priority with
//!   inheritance
//! - **Protocols**: FCFS, priority and priority-inheritance resource
//!   arbitration
//! - **Trace**: Per-tick event log with derived statistics
//!
//! # Usage
//!
//! ```rust,no_run
//! use sched_sim::*;
//!
//! let scenario = Scenario::builder()
//!     .add_process("low", 0, 6, 1)
//!     .hold(ResourceId::new(3).unwrap(), 1, 4)
//!     .add_process("high", 2, 3, 5)
//!     .hold(ResourceId::new(3).unwrap(), 0, 1)
//!     .build();
//!
//! let trace = Simulator::new(Policy::Pip).run(scenario);
//! print!("{}", trace.timeline());
//! print!("{}", TraceStats::from_trace(&trace));
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod fmt;
pub mod monitor;
pub mod process;
pub mod protocol;
pub mod queue;
pub mod resource;
pub mod scenario;
pub mod sched;
pub mod stats;
pub mod trace;
pub mod types;
pub mod workload;

// Re-export the main public types for convenience.
pub use context::SchedContext;
pub use engine::{sim_tick, Simulator};
pub use error::SimError;
pub use fmt::{FmtTick, SimFormat};
pub use monitor::{Monitor, ProbeContext, ProbePoint};
pub use process::{Process, ProcessDef, ProcessStatus, ResourceRequest};
pub use protocol::Arbitration;
pub use queue::ProcQueue;
pub use resource::{Resource, ResourceTable};
pub use scenario::{Scenario, ScenarioBuilder, ScenarioError, DEFAULT_MAX_TICKS};
pub use sched::{Policy, Scheduler};
pub use stats::{ProcessStats, TraceStats};
pub use trace::{ExitKind, Trace, TraceEvent, TraceKind};
pub use types::{Pid, Prio, ResourceId, Tick, NR_RESOURCES};
pub use workload::{load_workload, Workload, WorkloadError};
