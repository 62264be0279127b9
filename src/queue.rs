//! Ordered process queues.
//!
//! `ProcQueue` backs both the ready queue and every resource wait queue.
//! It is a plain FIFO of pids; priority and shortest-job policies select
//! by scanning it with [`ProcQueue::first_min_by_key`] and
//! [`ProcQueue::first_max_by_key`], which both favour the earliest entry
//! on ties.

use std::collections::VecDeque;

use crate::types::Pid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcQueue {
    entries: VecDeque<Pid>,
}

impl ProcQueue {
    pub fn new() -> Self {
        ProcQueue {
            entries: VecDeque::new(),
        }
    }

    /// Append a process at the tail.
    ///
    /// # Panics
    /// Panics if the pid is already queued.
    pub fn push_back(&mut self, pid: Pid) {
        assert!(
            !self.contains(pid),
            "pid={pid} is already linked into this queue"
        );
        self.entries.push_back(pid);
    }

    pub fn pop_front(&mut self) -> Option<Pid> {
        self.entries.pop_front()
    }

    pub fn front(&self) -> Option<Pid> {
        self.entries.front().copied()
    }

    /// Remove a specific pid. Returns true if it was queued.
    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.entries.iter().position(|&p| p == pid) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.entries.iter().copied()
    }

    /// First pid whose key is minimal.
    pub fn first_min_by_key<K: Ord>(&self, mut key: impl FnMut(Pid) -> K) -> Option<Pid> {
        let mut best: Option<(Pid, K)> = None;
        for pid in self.iter() {
            let k = key(pid);
            let better = match &best {
                Some((_, bk)) => k < *bk,
                None => true,
            };
            if better {
                best = Some((pid, k));
            }
        }
        best.map(|(pid, _)| pid)
    }

    /// First pid whose key is maximal.
    pub fn first_max_by_key<K: Ord>(&self, mut key: impl FnMut(Pid) -> K) -> Option<Pid> {
        let mut best: Option<(Pid, K)> = None;
        for pid in self.iter() {
            let k = key(pid);
            let better = match &best {
                Some((_, bk)) => k > *bk,
                None => true,
            };
            if better {
                best = Some((pid, k));
            }
        }
        best.map(|(pid, _)| pid)
    }
}
