//! Domain models for the locking feature
//!
//! - LockSet / ResourceTable: held resources with FIFO nesting
//! - AccessEvent: shared-memory accesses collected during solving

pub mod access;
pub mod lockset;

pub use access::{AccessEvent, AccessKind};
pub use lockset::{LockSet, LockViolation, ResourceId, ResourceTable};
