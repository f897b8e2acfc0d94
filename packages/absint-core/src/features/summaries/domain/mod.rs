//! Domain model for function summaries

pub mod summary;

pub use summary::{Summary, SummaryStore};
