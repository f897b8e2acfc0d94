//! # LockSet Domain and Race Detector
//!
//! Per-(context, point) locksets accumulated by acquire/release transfer
//! functions, and a pairwise detector over the access events the solver
//! collects. Protocol violations are warnings: the analysis continues
//! with a conservative lockset, never aborts.
//!
//! Precision always degrades toward "possible race", never toward a
//! silent false negative.
//!
//! ## References
//! - Savage et al. "Eraser: A Dynamic Data Race Detector" (TOCS 1997):
//!   the lockset discipline, applied here statically

pub mod domain;
pub mod infrastructure;

pub use domain::{AccessEvent, AccessKind, LockSet, LockViolation, ResourceId, ResourceTable};
pub use infrastructure::{RaceConfidence, RaceDetector, RaceReport};
