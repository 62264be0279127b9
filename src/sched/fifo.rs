//! FIFO: the ready-queue head runs until it finishes or blocks.

use super::{pick_head, runnable_current};
use crate::context::SchedContext;
use crate::types::Pid;

pub(super) fn schedule(ctx: &mut SchedContext) -> Option<Pid> {
    // No current process (first tick, or idle last tick), or it blocked on
    // a resource and now sits in that resource's wait queue.
    if let Some(current) = runnable_current(ctx) {
        return Some(current.pid);
    }
    pick_head(ctx)
}
