//! Shortest job first. The ready process with the smallest lifespan is
//! picked when the CPU frees up; a running process is never preempted.

use super::runnable_current;
use crate::context::SchedContext;
use crate::types::Pid;

pub(super) fn schedule(ctx: &mut SchedContext) -> Option<Pid> {
    if let Some(current) = runnable_current(ctx) {
        return Some(current.pid);
    }
    let next = ctx.ready_min_by_key(|p| p.lifespan)?;
    ctx.take_ready(next)
}
