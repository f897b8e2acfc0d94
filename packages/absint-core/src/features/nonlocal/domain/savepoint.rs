//! Save-point bookkeeping for non-local jumps.
//!
//! A jump is control flow, not an exception: it becomes an extra edge
//! from the jump site to the continuation of every live save point whose
//! environment matches, and the fixpoint solver treats the resumption as
//! an ordinary, possibly multi-source join point.

use rustc_hash::FxHashMap;

use crate::shared::models::{BlockId, Place};

/// One executed save point whose capturing frame is still live
#[derive(Debug, Clone, PartialEq)]
pub struct SavePoint {
    /// Environment the pair is matched on (the jmp_buf identity)
    pub env: String,
    /// Function containing the save point
    pub function: String,
    /// Block holding the save-point statement
    pub block: BlockId,
    /// Index of the save-point statement within its block; resumption
    /// continues at the following statement
    pub stmt_idx: usize,
    /// Local binding receiving 0 on first arrival and the jump payload
    /// on resumption
    pub dest: Place,
}

impl SavePoint {
    /// Program position where resumption re-enters normal flow
    pub fn continuation(&self) -> (BlockId, usize) {
        (self.block, self.stmt_idx + 1)
    }
}

/// Registry of live save points, keyed by environment
#[derive(Debug, Clone, Default)]
pub struct SavePointRegistry {
    live: FxHashMap<String, Vec<SavePoint>>,
}

impl SavePointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an executed save point; idempotent per (env, position)
    pub fn register(&mut self, sp: SavePoint) {
        let entries = self.live.entry(sp.env.clone()).or_default();
        if !entries.contains(&sp) {
            entries.push(sp);
        }
    }

    /// Save points a jump on `env` may resume
    pub fn lookup(&self, env: &str) -> &[SavePoint] {
        self.live.get(env).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A frame exited: its save points are no longer valid targets
    pub fn retire_frame(&mut self, function: &str) {
        for entries in self.live.values_mut() {
            entries.retain(|sp| sp.function != function);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.live.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(env: &str, function: &str) -> SavePoint {
        SavePoint {
            env: env.into(),
            function: function.into(),
            block: 0,
            stmt_idx: 2,
            dest: Place::var("val"),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = SavePointRegistry::new();
        reg.register(sp("env_buffer", "main"));
        reg.register(sp("env_buffer", "main")); // idempotent
        assert_eq!(reg.lookup("env_buffer").len(), 1);
        assert_eq!(reg.lookup("env_buffer")[0].continuation(), (0, 3));
        assert!(reg.lookup("other").is_empty());
    }

    #[test]
    fn test_retire_frame_kills_targets() {
        let mut reg = SavePointRegistry::new();
        reg.register(sp("env", "f"));
        reg.register(sp("env", "g"));
        reg.retire_frame("f");
        assert_eq!(reg.lookup("env").len(), 1);
        assert_eq!(reg.lookup("env")[0].function, "g");
    }
}
