//! Round-robin with a one-tick quantum.

use super::{pick_head, runnable_current};
use crate::context::SchedContext;
use crate::types::Pid;

pub(super) fn schedule(ctx: &mut SchedContext) -> Option<Pid> {
    let Some(current) = runnable_current(ctx).map(|p| p.pid) else {
        return pick_head(ctx);
    };
    if ctx.ready.is_empty() {
        return Some(current);
    }
    ctx.requeue(current);
    pick_head(ctx)
}
