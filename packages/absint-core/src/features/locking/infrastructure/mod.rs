//! Infrastructure for the locking feature

pub mod race_detector;

pub use race_detector::{RaceConfidence, RaceDetector, RaceReport};
