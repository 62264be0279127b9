//! Per-process scheduling statistics computed from a trace.
//!
//! - **Turnaround**: completion tick minus arrival tick
//! - **Response**: first executed tick minus arrival tick
//! - **Waiting**: turnaround minus executed ticks

use std::fmt;

use crate::trace::Trace;
use crate::types::{Pid, Tick};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStats {
    pub pid: Pid,
    pub arrival: Tick,
    pub first_run: Option<Tick>,
    pub completion: Option<Tick>,
    /// Ticks executed.
    pub run_ticks: Tick,
    /// Ticks dispatched but blocked on a resource.
    pub blocked_ticks: Tick,
}

impl ProcessStats {
    pub fn turnaround(&self) -> Option<Tick> {
        self.completion.map(|c| c - self.arrival)
    }

    pub fn response(&self) -> Option<Tick> {
        self.first_run.map(|f| f - self.arrival)
    }

    pub fn waiting(&self) -> Option<Tick> {
        self.turnaround().map(|t| t.saturating_sub(self.run_ticks))
    }
}

/// Statistics for a whole run.
#[derive(Debug, Clone)]
pub struct TraceStats {
    pub processes: Vec<ProcessStats>,
    pub idle_ticks: Tick,
    pub end_tick: Tick,
}

impl TraceStats {
    pub fn from_trace(trace: &Trace) -> Self {
        let processes = trace
            .pids()
            .into_iter()
            .map(|pid| ProcessStats {
                pid,
                arrival: trace.fork_tick(pid).unwrap_or(0),
                first_run: trace.first_run_tick(pid),
                completion: trace.completion_tick(pid),
                run_ticks: trace.run_count(pid) as Tick,
                blocked_ticks: trace.blocked_count(pid) as Tick,
            })
            .collect();
        TraceStats {
            processes,
            idle_ticks: trace.idle_count() as Tick,
            end_tick: trace.end_tick(),
        }
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessStats> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    /// Mean turnaround over completed processes.
    pub fn mean_turnaround(&self) -> f64 {
        mean(self.processes.iter().filter_map(ProcessStats::turnaround))
    }

    pub fn mean_response(&self) -> f64 {
        mean(self.processes.iter().filter_map(ProcessStats::response))
    }

    pub fn mean_waiting(&self) -> f64 {
        mean(self.processes.iter().filter_map(ProcessStats::waiting))
    }

    /// Share of ticks spent running a process, as a percentage.
    pub fn utilization_percent(&self) -> f64 {
        if self.end_tick == 0 {
            return 0.0;
        }
        let busy: Tick = self.processes.iter().map(|p| p.run_ticks).sum();
        busy as f64 * 100.0 / self.end_tick as f64
    }
}

fn mean(values: impl Iterator<Item = Tick>) -> f64 {
    let (sum, n) = values.fold((0u64, 0u64), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

fn opt(v: Option<Tick>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for TraceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>5} {:>7} {:>7} {:>7} {:>6} {:>7} {:>10} {:>8} {:>7}",
            "pid", "arrival", "first", "done", "run", "blocked", "turnaround", "response", "waiting"
        )?;
        for p in &self.processes {
            writeln!(
                f,
                "{:>5} {:>7} {:>7} {:>7} {:>6} {:>7} {:>10} {:>8} {:>7}",
                p.pid.0,
                p.arrival,
                opt(p.first_run),
                opt(p.completion),
                p.run_ticks,
                p.blocked_ticks,
                opt(p.turnaround()),
                opt(p.response()),
                opt(p.waiting()),
            )?;
        }
        writeln!(
            f,
            "avg turnaround {:.2}  avg response {:.2}  avg waiting {:.2}  \
             utilization {:.1}%  idle {}  ticks {}",
            self.mean_turnaround(),
            self.mean_response(),
            self.mean_waiting(),
            self.utilization_percent(),
            self.idle_ticks,
            self.end_tick
        )
    }
}
