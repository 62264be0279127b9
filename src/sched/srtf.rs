//! Shortest remaining time first.
//!
//! Every tick the running process competes with the ready queue on
//! `lifespan - age`. It keeps the CPU unless a ready process has strictly
//! less time left, in which case it goes back to the ready-queue tail.

use super::runnable_current;
use crate::context::SchedContext;
use crate::types::Pid;

pub(super) fn schedule(ctx: &mut SchedContext) -> Option<Pid> {
    let shortest = ctx
        .ready_min_by_key(|p| p.remaining())
        .and_then(|pid| ctx.process(pid).ok().map(|p| (pid, p.remaining())));

    let Some((current, current_remaining)) =
        runnable_current(ctx).map(|p| (p.pid, p.remaining()))
    else {
        let (next, _) = shortest?;
        return ctx.take_ready(next);
    };

    match shortest {
        Some((next, remaining)) if remaining < current_remaining => {
            ctx.requeue(current);
            ctx.take_ready(next)
        }
        _ => Some(current),
    }
}
