// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Error taxonomy for `MATCH_RECOGNIZE` compilation.
//!
//! Every failure aborts compilation of the whole clause. There is no partial
//! plan and nothing is retried: the same input always produces the same error.
//! Each variant carries the offending symbol, measure, or bound so callers can
//! render a precise diagnostic.

use std::fmt;

use crate::pattern::tree::PatternSymbol;
use crate::planner::PlanError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Where an anchor (`^` / `$`) was found when it is not allowed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorContext {
    /// Listed as a `PERMUTE` member.
    InsidePermute,
    /// Wrapped in an exclusion `{- ... -}`.
    InsideExclusion,
    /// Used as the operand of a quantifier.
    Quantified,
    /// Anywhere other than the first (`^`) or last (`$`) element of the
    /// top-level concatenation.
    NotAtBoundary,
}

impl fmt::Display for AnchorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InsidePermute => "inside PERMUTE",
            Self::InsideExclusion => "inside an exclusion",
            Self::Quantified => "as the operand of a quantifier",
            Self::NotAtBoundary => "away from the pattern boundary",
        })
    }
}

/// The expression being bound when the scalar planner failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingContext {
    /// The `DEFINE` condition of the named pattern variable.
    Define(String),
    /// The `MEASURES` entry with the given output name.
    Measure(String),
    /// The `PARTITION BY` key at the given zero-based position.
    PartitionKey(usize),
    /// The `ORDER BY` key at the given zero-based position.
    OrderKey(usize),
}

impl fmt::Display for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Define(symbol) => write!(f, "DEFINE {symbol}"),
            Self::Measure(name) => write!(f, "measure {name}"),
            Self::PartitionKey(idx) => write!(f, "PARTITION BY key {}", idx + 1),
            Self::OrderKey(idx) => write!(f, "ORDER BY key {}", idx + 1),
        }
    }
}

/// Error returned when a `MATCH_RECOGNIZE` clause fails to compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum CompileError {
    /// An anchor appears somewhere it cannot match.
    #[error("anchor {anchor} is not allowed {context}")]
    InvalidAnchorPosition {
        /// The anchor (`^` or `$`).
        anchor: PatternSymbol,
        /// Where it was found.
        context: AnchorContext,
    },

    /// A `PERMUTE` lists the same symbol twice.
    #[error("symbol {symbol} appears more than once in PERMUTE")]
    DuplicatePermuteSymbol {
        /// Normalized name of the repeated symbol.
        symbol: String,
    },

    /// `{n,m}` with `n > m`.
    #[error("invalid pattern quantifier: minimum {min} exceeds maximum {max}")]
    InvalidQuantifierRange {
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },

    /// A quantifier that can only ever repeat zero times (`{0,0}`, `{0}`, `{,0}`).
    #[error("invalid pattern quantifier: {quantifier} can never match")]
    EmptyQuantifierRange {
        /// Surface form of the offending quantifier.
        quantifier: String,
    },

    /// A literal repetition count above the configured maximum.
    #[error("pattern quantifier count {count} exceeds the maximum of {max}")]
    QuantifierOutOfBounds {
        /// The literal count.
        count: u32,
        /// The configured maximum.
        max: u32,
    },

    /// The pattern nests deeper than the configured limit.
    #[error("pattern nesting exceeds the maximum depth of {limit}")]
    PatternTooDeep {
        /// The configured limit.
        limit: usize,
    },

    /// `DEFINE` names a variable that `PATTERN` never mentions.
    #[error("pattern variable {symbol} is defined but not referenced in PATTERN")]
    UndeclaredDefinition {
        /// Normalized variable name.
        symbol: String,
    },

    /// Two `DEFINE` entries for the same variable.
    #[error("pattern variable {symbol} is defined more than once")]
    DuplicateDefinition {
        /// Normalized variable name.
        symbol: String,
    },

    /// `AFTER MATCH SKIP TO FIRST|LAST` names an unknown variable.
    #[error("AFTER MATCH SKIP target {symbol} is not a pattern variable")]
    UnknownSkipTargetSymbol {
        /// Normalized target name.
        symbol: String,
    },

    /// A `SUBSET` member that is not a pattern variable.
    #[error("SUBSET {subset} references unknown pattern variable {symbol}")]
    UnknownSubsetSymbol {
        /// Normalized subset name.
        subset: String,
        /// Normalized member name.
        symbol: String,
    },

    /// A `SUBSET` name that shadows a pattern variable or another subset.
    #[error("SUBSET name {name} is already declared")]
    DuplicateSubset {
        /// Normalized subset name.
        name: String,
    },

    /// Two measures with the same output name.
    #[error("measure {name} is declared more than once")]
    DuplicateMeasure {
        /// Normalized output name.
        name: String,
    },

    /// A pattern variable qualifier would make column resolution ambiguous.
    #[error("pattern variable {variable} conflicts with existing column {existing}")]
    SchemaAugmentationConflict {
        /// Normalized pattern variable (or subset) name.
        variable: String,
        /// The base column it collides with, as `qualifier.name` when qualified.
        existing: String,
    },

    /// The scalar-expression planner rejected an expression.
    #[error("cannot plan {context}: {source}")]
    Plan {
        /// What was being bound.
        context: BindingContext,
        /// The planner's error.
        #[source]
        source: PlanError,
    },
}

impl CompileError {
    /// Tags a planner error with the expression that produced it.
    pub const fn plan(context: BindingContext, source: PlanError) -> Self {
        Self::Plan { context, source }
    }
}
