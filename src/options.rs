// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Compilation limits.
//!
//! Both knobs bound compile-time and runtime cost; neither is required by the
//! SQL standard. With the `serde` feature enabled, [`CompileOptions`] can be
//! read from any serde format, and missing keys fall back to the defaults.

/// Default upper bound for a literal repetition count such as `{n}` or `{n,m}`.
pub const DEFAULT_MAX_QUANTIFIER_BOUND: u32 = 100_000;

/// Default maximum nesting depth of a pattern tree.
pub const DEFAULT_MAX_PATTERN_DEPTH: usize = 128;

/// Limits applied while compiling a `MATCH_RECOGNIZE` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[non_exhaustive]
pub struct CompileOptions {
    /// Largest literal count accepted in a quantifier. Larger counts fail
    /// with `QuantifierOutOfBounds`.
    pub max_quantifier_bound: u32,
    /// Deepest pattern nesting accepted. Deeper trees fail with
    /// `PatternTooDeep` instead of exhausting the call stack.
    pub max_pattern_depth: usize,
}

impl CompileOptions {
    /// Creates options with the default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_quantifier_bound: DEFAULT_MAX_QUANTIFIER_BOUND,
            max_pattern_depth: DEFAULT_MAX_PATTERN_DEPTH,
        }
    }

    /// Sets the largest literal quantifier count.
    #[must_use]
    pub const fn with_max_quantifier_bound(mut self, bound: u32) -> Self {
        self.max_quantifier_bound = bound;
        self
    }

    /// Sets the maximum pattern nesting depth.
    #[must_use]
    pub const fn with_max_pattern_depth(mut self, depth: usize) -> Self {
        self.max_pattern_depth = depth;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new()
    }
}
