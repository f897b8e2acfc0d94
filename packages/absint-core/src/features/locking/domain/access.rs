//! Memory access events collected during solving.

use serde::{Deserialize, Serialize};

use super::lockset::ResourceId;
use crate::features::memory::RegionId;
use crate::shared::models::{SourceLoc, ThreadContext};

/// Read or write access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    pub fn is_write(&self) -> bool {
        matches!(self, AccessKind::Write)
    }
}

/// One access to a shared region at a program point.
///
/// The race detector post-processes the full event set once solving has
/// converged; events are immutable snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub region: RegionId,
    pub kind: AccessKind,
    pub locks: Vec<ResourceId>,
    pub ctx: ThreadContext,
    pub loc: SourceLoc,
    /// True for accesses that happen before any thread was spawned
    /// (single-threaded prefix of the main context)
    pub before_spawn: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_kind() {
        assert!(AccessKind::Write.is_write());
        assert!(!AccessKind::Read.is_write());
    }
}
