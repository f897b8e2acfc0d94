//! Domain model for the scheduling feature

pub mod scheduler;

pub use scheduler::Scheduler;
