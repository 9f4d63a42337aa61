//! Deterministic identifier synthesis (`SPEC_FULL.md` §10 supplement #3).
//!
//! Grounded on `examples/original_source/src/sym_table.cpp`'s
//! `rand_value_name`-style counters, one per bucket, so that names are a
//! pure function of generation order — never of the RNG — keeping the
//! determinism property (`spec.md` §8 property 1) independent of exactly
//! how many random draws a given run happens to make.

use std::collections::HashMap;

use crate::consts;

/// Per-prefix monotonic counters used to synthesize variable, struct, and
/// function names.
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    counters: HashMap<&'static str, u32>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `"{prefix}{n}"` name for `prefix`, advancing its counter.
    pub fn next(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        let name = format!("{prefix}{counter}");
        *counter += 1;
        name
    }

    pub fn next_input(&mut self) -> String {
        self.next(consts::INPUT_PREFIX)
    }

    pub fn next_mixed(&mut self) -> String {
        self.next(consts::MIXED_PREFIX)
    }

    pub fn next_output(&mut self) -> String {
        self.next(consts::OUTPUT_PREFIX)
    }

    pub fn next_local(&mut self) -> String {
        self.next(consts::LOCAL_PREFIX)
    }

    pub fn next_struct_type(&mut self) -> String {
        self.next(consts::STRUCT_TYPE_PREFIX)
    }

    pub fn next_func(&mut self) -> String {
        self.next(consts::FUNC_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent_per_prefix_and_start_at_zero() {
        let mut gen = NameGenerator::new();
        assert_eq!(gen.next_input(), "var_inp0");
        assert_eq!(gen.next_input(), "var_inp1");
        assert_eq!(gen.next_mixed(), "var_mix0");
        assert_eq!(gen.next_input(), "var_inp2");
    }
}
