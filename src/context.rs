//! Scheduling context shared by the driver, the schedulers and the
//! resource protocols.
//!
//! The context owns the process arena, the ready queue, the resource table
//! and the current-process handle. Processes are referenced everywhere by
//! `Pid`; queues hold pids, never process records, so a process can only
//! be in a queue by value of its id and the arena stays the single owner.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::SimError;
use crate::process::{Process, ProcessDef, ProcessStatus};
use crate::queue::ProcQueue;
use crate::resource::ResourceTable;
use crate::types::{Pid, Tick};

#[derive(Debug, Clone, Default)]
pub struct SchedContext {
    processes: BTreeMap<Pid, Process>,
    /// Processes eligible to run. Never contains the running process.
    pub ready: ProcQueue,
    pub resources: ResourceTable,
    /// Process dispatched by the last `schedule()` call. A process that
    /// blocked during its tick stays current (in `Wait`) until the next
    /// `schedule()` replaces it.
    pub current: Option<Pid>,
    /// Monotonically increasing tick counter.
    pub ticks: Tick,
}

impl SchedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a process from its definition and append it to the ready
    /// queue.
    pub fn fork(&mut self, def: &ProcessDef) -> Result<Pid, SimError> {
        if self.processes.contains_key(&def.pid) {
            return Err(SimError::Invariant(format!(
                "pid={} forked twice",
                def.pid
            )));
        }
        let process = Process::new(def);
        let pid = process.pid;
        self.processes.insert(pid, process);
        self.ready.push_back(pid);
        Ok(pid)
    }

    /// Remove a finished process from the arena.
    ///
    /// The process must be detached from every queue and own nothing.
    pub fn exit(&mut self, pid: Pid) -> Result<Process, SimError> {
        if self.ready.contains(pid) || self.resources.waiting_on(pid).is_some() {
            return Err(SimError::Invariant(format!(
                "pid={pid} exiting while still queued"
            )));
        }
        if let Some(id) = self.resources.owned_by(pid).next() {
            return Err(SimError::Invariant(format!(
                "pid={pid} exiting while owning resource {id}"
            )));
        }
        let mut process = self
            .processes
            .remove(&pid)
            .ok_or(SimError::UnknownProcess(pid))?;
        process.status = ProcessStatus::Exited;
        if self.current == Some(pid) {
            self.current = None;
        }
        Ok(process)
    }

    pub fn process(&self, pid: Pid) -> Result<&Process, SimError> {
        self.processes.get(&pid).ok_or(SimError::UnknownProcess(pid))
    }

    pub fn process_mut(&mut self, pid: Pid) -> Result<&mut Process, SimError> {
        self.processes
            .get_mut(&pid)
            .ok_or(SimError::UnknownProcess(pid))
    }

    /// Live processes in pid order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn nr_processes(&self) -> usize {
        self.processes.len()
    }

    /// The current process's pid, for `acquire`/`release`.
    pub fn current_pid(&self) -> Result<Pid, SimError> {
        self.current.ok_or(SimError::NoCurrentProcess)
    }

    pub fn current_process(&self) -> Option<&Process> {
        self.current.and_then(|pid| self.processes.get(&pid))
    }

    /// Put a preempted process back at the tail of the ready queue.
    pub fn requeue(&mut self, pid: Pid) {
        if let Some(p) = self.processes.get_mut(&pid) {
            p.status = ProcessStatus::Ready;
        }
        self.ready.push_back(pid);
    }

    /// Detach a process chosen by a scheduler from the ready queue.
    pub fn take_ready(&mut self, pid: Pid) -> Option<Pid> {
        self.ready.remove(pid).then_some(pid)
    }

    /// First ready process with the minimal key.
    pub fn ready_min_by_key<K: Ord>(&self, key: impl Fn(&Process) -> K) -> Option<Pid> {
        let processes = &self.processes;
        self.ready
            .first_min_by_key(|pid| processes.get(&pid).map(&key))
    }

    /// First ready process with the maximal key.
    pub fn ready_max_by_key<K: Ord>(&self, key: impl Fn(&Process) -> K) -> Option<Pid> {
        let processes = &self.processes;
        self.ready
            .first_max_by_key(|pid| processes.get(&pid).map(&key))
    }

    /// Render the current process, the ready queue and every resource
    /// that is owned or has waiters.
    pub fn dump_status(&self) -> String {
        StatusDump(self).to_string()
    }

    /// Check the structural invariants of the context.
    ///
    /// - every queued or owning pid is live;
    /// - a pid is linked into at most one queue;
    /// - ready-queue members are `Ready`, wait-queue members are `Wait`;
    /// - an owner never waits on its own resource;
    /// - a `Running` process is in no queue;
    /// - `prio >= prio_orig` for every process.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        let mut linked: BTreeMap<Pid, &'static str> = BTreeMap::new();
        let mut link = |pid: Pid, what: &'static str| -> Result<(), SimError> {
            if let Some(prev) = linked.insert(pid, what) {
                return Err(SimError::Invariant(format!(
                    "pid={pid} linked into {prev} and {what}"
                )));
            }
            Ok(())
        };

        for pid in self.ready.iter() {
            let p = self.process(pid)?;
            if p.status != ProcessStatus::Ready {
                return Err(SimError::Invariant(format!(
                    "pid={pid} in ready queue with status {:?}",
                    p.status
                )));
            }
            if self.current == Some(pid) {
                return Err(SimError::Invariant(format!(
                    "running pid={pid} still in ready queue"
                )));
            }
            link(pid, "ready queue")?;
        }

        for (id, r) in self.resources.iter() {
            if let Some(owner) = r.owner {
                self.process(owner)?;
                if r.waitqueue.contains(owner) {
                    return Err(SimError::Invariant(format!(
                        "owner pid={owner} waits on its own resource {id}"
                    )));
                }
            }
            for pid in r.waitqueue.iter() {
                let p = self.process(pid)?;
                if p.status != ProcessStatus::Wait {
                    return Err(SimError::Invariant(format!(
                        "pid={pid} in wait queue of resource {id} with status {:?}",
                        p.status
                    )));
                }
                link(pid, "a resource wait queue")?;
            }
        }

        for p in self.processes.values() {
            if p.prio < p.prio_orig {
                return Err(SimError::Invariant(format!(
                    "pid={} prio {} below baseline {}",
                    p.pid, p.prio, p.prio_orig
                )));
            }
            if p.status == ProcessStatus::Running && linked.contains_key(&p.pid) {
                return Err(SimError::Invariant(format!(
                    "running pid={} is queued",
                    p.pid
                )));
            }
        }
        Ok(())
    }
}

struct StatusDump<'a>(&'a SchedContext);

impl fmt::Display for StatusDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0;
        write!(f, "tick {}: current ", ctx.ticks)?;
        match ctx.current_process() {
            Some(p) => writeln!(
                f,
                "pid={} {:?} age={}/{} prio={}/{}",
                p.pid, p.status, p.age, p.lifespan, p.prio, p.prio_orig
            )?,
            None => writeln!(f, "none")?,
        }
        let ready: Vec<String> = ctx.ready.iter().map(|p| p.to_string()).collect();
        writeln!(f, "  ready: [{}]", ready.join(", "))?;
        for (id, r) in ctx.resources.iter().filter(|(_, r)| !r.is_idle()) {
            let owner = r
                .owner
                .map_or_else(|| "-".to_string(), |pid| pid.to_string());
            let waiters: Vec<String> = r.waitqueue.iter().map(|p| p.to_string()).collect();
            writeln!(
                f,
                "  resource {id:>2}: owner={owner} wait=[{}]",
                waiters.join(", ")
            )?;
        }
        Ok(())
    }
}
