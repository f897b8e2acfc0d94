//! Thread contexts: the closed set of execution contexts the scheduler
//! reasons about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A statically enumerable execution context.
///
/// Plain threads (main + spawn sites) have no priority and are always
/// mutually concurrent; Tasks and ISRs carry static priorities and obey
/// the priority-ceiling protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThreadContext {
    /// The initial program context
    Main,
    /// One context per syntactic spawn site
    Thread { spawn_site: String },
    /// Cooperative task entry point
    Task { name: String, priority: u32 },
    /// Interrupt service routine entry point
    Isr { name: String, priority: u32 },
}

impl ThreadContext {
    /// Static priority; plain threads have none
    pub fn priority(&self) -> Option<u32> {
        match self {
            ThreadContext::Main | ThreadContext::Thread { .. } => None,
            ThreadContext::Task { priority, .. } | ThreadContext::Isr { priority, .. } => {
                Some(*priority)
            }
        }
    }

    /// Whether this context participates in the priority-ceiling protocol
    pub fn is_prioritized(&self) -> bool {
        self.priority().is_some()
    }

    pub fn is_isr(&self) -> bool {
        matches!(self, ThreadContext::Isr { .. })
    }
}

impl fmt::Display for ThreadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadContext::Main => write!(f, "main"),
            ThreadContext::Thread { spawn_site } => write!(f, "thread@{}", spawn_site),
            ThreadContext::Task { name, priority } => write!(f, "task:{}(p{})", name, priority),
            ThreadContext::Isr { name, priority } => write!(f, "isr:{}(p{})", name, priority),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities() {
        assert_eq!(ThreadContext::Main.priority(), None);
        let isr = ThreadContext::Isr {
            name: "i0".into(),
            priority: 3,
        };
        assert_eq!(isr.priority(), Some(3));
        assert!(isr.is_isr());
    }
}
