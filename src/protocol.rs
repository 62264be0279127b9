//! Resource acquisition and release protocols.
//!
//! Three arbitration strategies share one structure: a free resource is
//! handed to the caller, a busy one parks the caller on the resource's wait
//! queue in `Wait` status, and a release hands the resource's waiters one
//! wake-up. They differ in which waiter is woken and in whether the owner's
//! priority follows its waiters.
//!
//! - [`Arbitration::Fcfs`]: the oldest waiter is woken.
//! - [`Arbitration::Priority`]: the waiter with the highest baseline
//!   priority is woken.
//! - [`Arbitration::Inheritance`]: an owner inherits the priority of a
//!   more important requester until it releases; the waiter with the
//!   highest current priority is woken once every other resource it needs
//!   at its current age is free.

use tracing::debug;

use crate::context::SchedContext;
use crate::error::SimError;
use crate::process::ProcessStatus;
use crate::types::{Pid, ResourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    Fcfs,
    Priority,
    Inheritance,
}

impl Arbitration {
    /// Try to take `id` on behalf of the current process.
    ///
    /// Returns `Ok(false)` when the caller was parked on the wait queue; the
    /// driver is then expected to call `schedule()` to pick another process.
    pub fn acquire(self, ctx: &mut SchedContext, id: ResourceId) -> Result<bool, SimError> {
        let pid = ctx.current_pid()?;
        ctx.process(pid)?;

        let owner = match ctx.resources.get(id).owner {
            None => {
                ctx.resources.get_mut(id).owner = Some(pid);
                debug!(pid = pid.0, resource = id.raw(), "acquired");
                return Ok(true);
            }
            Some(owner) if owner == pid => {
                return Err(SimError::AlreadyOwner { resource: id, pid });
            }
            Some(owner) => owner,
        };

        if self == Arbitration::Inheritance {
            inherit(ctx, pid, owner)?;
        }
        park(ctx, pid, id)?;
        debug!(
            pid = pid.0,
            resource = id.raw(),
            owner = owner.0,
            "blocked"
        );
        Ok(false)
    }

    /// Release `id`, which the current process must own, and wake one
    /// waiter.
    pub fn release(self, ctx: &mut SchedContext, id: ResourceId) -> Result<(), SimError> {
        let pid = ctx.current_pid()?;
        let owner = ctx.resources.get(id).owner;
        if owner != Some(pid) {
            return Err(SimError::NotOwner {
                resource: id,
                owner,
                caller: pid,
            });
        }

        if self == Arbitration::Inheritance {
            let p = ctx.process_mut(pid)?;
            if p.prio != p.prio_orig {
                debug!(pid = pid.0, from = p.prio, to = p.prio_orig, "restore prio");
            }
            p.prio = p.prio_orig;
        }
        ctx.resources.get_mut(id).owner = None;
        debug!(pid = pid.0, resource = id.raw(), "released");

        let waiter = match self {
            Arbitration::Fcfs => ctx.resources.get(id).waitqueue.front(),
            Arbitration::Priority => select_waiter(ctx, id, |prio, _| prio)?,
            Arbitration::Inheritance => select_waiter(ctx, id, |_, prio| prio)?,
        };
        let Some(waiter) = waiter else {
            return Ok(());
        };

        let status = ctx.process(waiter)?.status;
        if status != ProcessStatus::Wait {
            return Err(SimError::WaiterNotWaiting {
                pid: waiter,
                status,
            });
        }
        ctx.resources.get_mut(id).waitqueue.remove(waiter);

        if self == Arbitration::Inheritance {
            if let Some(next) = outstanding_blocker(ctx, waiter, id)? {
                let next_owner = ctx.resources.get(next).owner;
                if let Some(next_owner) = next_owner {
                    inherit(ctx, waiter, next_owner)?;
                }
                ctx.resources.get_mut(next).waitqueue.push_back(waiter);
                debug!(
                    pid = waiter.0,
                    resource = next.raw(),
                    "still blocked on another resource"
                );
                return Ok(());
            }
        }

        ctx.process_mut(waiter)?.status = ProcessStatus::Ready;
        ctx.ready.push_back(waiter);
        debug!(pid = waiter.0, resource = id.raw(), "woke");
        Ok(())
    }
}

/// Move `pid` to `Wait` and append it to the wait queue of `id`.
fn park(ctx: &mut SchedContext, pid: Pid, id: ResourceId) -> Result<(), SimError> {
    ctx.process_mut(pid)?.status = ProcessStatus::Wait;
    ctx.resources.get_mut(id).waitqueue.push_back(pid);
    Ok(())
}

/// Raise `owner` to the priority of `requester` if the requester is more
/// important.
fn inherit(ctx: &mut SchedContext, requester: Pid, owner: Pid) -> Result<(), SimError> {
    let prio = ctx.process(requester)?.prio;
    let o = ctx.process_mut(owner)?;
    if prio > o.prio {
        debug!(pid = owner.0, from = o.prio, to = prio, "inherit prio");
        o.prio = prio;
    }
    Ok(())
}

/// First waiter of `id` with the maximal key, computed from
/// `(prio_orig, prio)`.
fn select_waiter(
    ctx: &SchedContext,
    id: ResourceId,
    key: impl Fn(u32, u32) -> u32,
) -> Result<Option<Pid>, SimError> {
    let waitqueue = &ctx.resources.get(id).waitqueue;
    for pid in waitqueue.iter() {
        ctx.process(pid)?;
    }
    Ok(waitqueue.first_max_by_key(|pid| {
        ctx.process(pid)
            .map(|p| key(p.prio_orig, p.prio))
            .unwrap_or_default()
    }))
}

/// A resource other than `freed` that `pid` must acquire at its current age
/// and that somebody still owns.
fn outstanding_blocker(
    ctx: &SchedContext,
    pid: Pid,
    freed: ResourceId,
) -> Result<Option<ResourceId>, SimError> {
    let p = ctx.process(pid)?;
    Ok(p.due_requests()
        .map(|r| r.resource)
        .filter(|&r| r != freed)
        .find(|&r| !ctx.resources.get(r).is_free()))
}
