//! Mutually-exclusive resources.

use crate::queue::ProcQueue;
use crate::types::{Pid, ResourceId, NR_RESOURCES};

/// A resource: at most one owner plus the processes blocked on it.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    /// `None` means the resource is free.
    pub owner: Option<Pid>,
    pub waitqueue: ProcQueue,
}

impl Resource {
    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// Free with nobody waiting.
    pub fn is_idle(&self) -> bool {
        self.owner.is_none() && self.waitqueue.is_empty()
    }
}

/// The fixed table of `NR_RESOURCES` resources.
#[derive(Debug, Clone)]
pub struct ResourceTable {
    resources: [Resource; NR_RESOURCES],
}

impl ResourceTable {
    pub fn new() -> Self {
        ResourceTable {
            resources: std::array::from_fn(|_| Resource::default()),
        }
    }

    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.resources[id.index()]
    }

    pub fn get_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.index()]
    }

    /// All resources with their ids, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(i, r)| ResourceId::new(i as u32).ok().map(|id| (id, r)))
    }

    /// Resources currently owned by `pid`.
    pub fn owned_by(&self, pid: Pid) -> impl Iterator<Item = ResourceId> + '_ {
        self.iter()
            .filter(move |(_, r)| r.owner == Some(pid))
            .map(|(id, _)| id)
    }

    /// The resource whose wait queue holds `pid`, if any.
    pub fn waiting_on(&self, pid: Pid) -> Option<ResourceId> {
        self.iter()
            .find(|(_, r)| r.waitqueue.contains(pid))
            .map(|(id, _)| id)
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}
