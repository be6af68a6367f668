//! Unique ids for generated function names.
//!
//! Lifted blocks and lambdas are named `<prefix><id>`. The generator is a
//! dependency of the transpiler, so tests pin names by choosing the
//! generator and its seed.

use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Source of unique suffixes for generated definitions.
pub trait NameGenerator {
    /// Next id. Ids must not repeat within one generator.
    fn next_id(&mut self) -> String;
}

/// Counter-based ids: `1`, `2`, `3`, ...
#[derive(Clone, Debug)]
pub struct SequentialNames {
    next: u64,
}

impl SequentialNames {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        SequentialNames { next: first }
    }
}

impl Default for SequentialNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator for SequentialNames {
    fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }
}

/// Seeded hex ids that look random but are reproducible.
///
/// The counter is appended so ids stay unique even on a hash collision.
#[derive(Clone, Debug)]
pub struct SeededNames {
    seed: u64,
    counter: u64,
}

impl SeededNames {
    pub fn new(seed: u64) -> Self {
        SeededNames { seed, counter: 0 }
    }
}

impl NameGenerator for SeededNames {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        let mut hasher = FxHasher::default();
        hasher.write_u64(self.seed);
        hasher.write_u64(self.counter);
        format!("{:016x}{:x}", hasher.finish(), self.counter)
    }
}
