//! # Scheduling / Resource Model
//!
//! Cooperative tasks and interrupt handlers as a fixed set of entry
//! points with static priorities under the priority-ceiling protocol.
//! Keeps the interleaving space finite: preemption is expressed as a
//! relation over (context, held locks) pairs instead of arbitrary thread
//! interleavings.
//!
//! ## References
//! - Sha, Rajkumar & Lehoczky "Priority Inheritance Protocols" (IEEE ToC 1990)

pub mod domain;

pub use domain::Scheduler;
