//! Newtype wrappers and type aliases for domain concepts.
//!
//! Identifiers (process ids, resource ids) are newtypes so a pid can never
//! be passed where a resource index is expected. Plain quantities (ticks,
//! priorities) are aliases.

use std::fmt;

use crate::error::SimError;

/// Process identifier. Also the key of the process arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Number of resources in the system.
pub const NR_RESOURCES: usize = 32;

/// Index into the resource table, always within `[0, NR_RESOURCES)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u32);

impl ResourceId {
    /// Validate a raw resource index.
    pub fn new(raw: u32) -> Result<Self, SimError> {
        if (raw as usize) < NR_RESOURCES {
            Ok(ResourceId(raw))
        } else {
            Err(SimError::InvalidResource(raw))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ResourceId {
    type Error = SimError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        ResourceId::new(raw)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Simulated time in ticks.
pub type Tick = u64;

/// Scheduling priority. Larger values are more important.
pub type Prio = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_bounds() {
        assert_eq!(ResourceId::new(0).map(ResourceId::index), Ok(0));
        assert_eq!(ResourceId::new(31).map(ResourceId::index), Ok(31));
        assert_eq!(ResourceId::new(32), Err(SimError::InvalidResource(32)));
        assert_eq!(
            ResourceId::try_from(u32::MAX),
            Err(SimError::InvalidResource(u32::MAX))
        );
    }
}
