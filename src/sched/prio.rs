//! Preemptive priority scheduling.
//!
//! Shared by the plain priority policy, which ranks on `prio_orig`, and the
//! priority-inheritance policy, which ranks on the possibly boosted `prio`.
//! The first maximal ready process wins among equals, and the running
//! process is only displaced by a strictly higher priority.

use super::runnable_current;
use crate::context::SchedContext;
use crate::process::Process;
use crate::types::{Pid, Prio};

pub(super) fn schedule(ctx: &mut SchedContext, rank: fn(&Process) -> Prio) -> Option<Pid> {
    let best = ctx
        .ready_max_by_key(rank)
        .and_then(|pid| ctx.process(pid).ok().map(|p| (pid, rank(p))));

    let Some((current, current_prio)) = runnable_current(ctx).map(|p| (p.pid, rank(p))) else {
        let (next, _) = best?;
        return ctx.take_ready(next);
    };

    match best {
        Some((next, prio)) if prio > current_prio => {
            ctx.requeue(current);
            ctx.take_ready(next)
        }
        _ => Some(current),
    }
}
