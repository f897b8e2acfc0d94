//! Source locations attached to statements and diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a statement in the original source
///
/// The core never reads source text; locations are opaque labels used for
/// diagnostics and for deduplicating race reports per location pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLoc {
    /// Source file path
    pub file: String,
    /// Line number (1-based)
    pub line: u32,
}

impl SourceLoc {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Synthetic location for statements a front end did not annotate
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0)
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = SourceLoc::new("main.c", 42);
        assert_eq!(format!("{}", loc), "main.c:42");
    }
}
