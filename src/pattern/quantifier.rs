// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Quantifier validation.
//!
//! The surface grammar accepts any non-negative counts in `{n}`, `{n,}`,
//! `{,m}` and `{n,m}`. This module rejects the ones that are meaningless or
//! too expensive, in this order:
//!
//! 1. `{n,m}` with `n > m` is an inverted range.
//! 2. A bound that can only repeat zero times (`{0,0}`, `{0}`, `{,0}`) is empty.
//! 3. Any literal count above the configured maximum is out of bounds.
//!
//! Negative counts cannot be written in the surface grammar and so are not
//! representable here.

use sqlparser::ast::RepetitionQuantifier as RawQuantifier;

use crate::error::{CompileError, Result};
use crate::pattern::tree::RepetitionQuantifier;

/// Validates a raw quantifier against `max_bound`.
///
/// Pure and total: the result depends only on the arguments.
///
/// # Examples
///
/// ```
/// use rowpattern::pattern::quantifier::validate_quantifier;
/// use rowpattern::pattern::tree::RepetitionQuantifier;
/// use sqlparser::ast::RepetitionQuantifier as Raw;
///
/// assert_eq!(
///     validate_quantifier(&Raw::Range(2, 5), 100_000).unwrap(),
///     RepetitionQuantifier::Range(2, 5)
/// );
/// assert!(validate_quantifier(&Raw::Range(5, 2), 100_000).is_err());
/// assert!(validate_quantifier(&Raw::Range(0, 0), 100_000).is_err());
/// ```
pub fn validate_quantifier(raw: &RawQuantifier, max_bound: u32) -> Result<RepetitionQuantifier> {
    let quantifier = match *raw {
        RawQuantifier::ZeroOrMore => RepetitionQuantifier::ZeroOrMore,
        RawQuantifier::OneOrMore => RepetitionQuantifier::OneOrMore,
        RawQuantifier::AtMostOne => RepetitionQuantifier::ZeroOrOne,
        RawQuantifier::Exactly(n) => RepetitionQuantifier::Exactly(n),
        RawQuantifier::AtLeast(n) => RepetitionQuantifier::AtLeast(n),
        RawQuantifier::AtMost(n) => RepetitionQuantifier::AtMost(n),
        RawQuantifier::Range(min, max) => {
            if min > max {
                return Err(CompileError::InvalidQuantifierRange { min, max });
            }
            RepetitionQuantifier::Range(min, max)
        }
    };

    if quantifier.max() == Some(0) {
        return Err(CompileError::EmptyQuantifierRange {
            quantifier: quantifier.to_string(),
        });
    }

    if let Some(count) = largest_literal(quantifier) {
        if count > max_bound {
            return Err(CompileError::QuantifierOutOfBounds {
                count,
                max: max_bound,
            });
        }
    }

    Ok(quantifier)
}

/// The largest count written literally in the quantifier, if any.
const fn largest_literal(quantifier: RepetitionQuantifier) -> Option<u32> {
    match quantifier {
        RepetitionQuantifier::ZeroOrMore
        | RepetitionQuantifier::OneOrMore
        | RepetitionQuantifier::ZeroOrOne => None,
        RepetitionQuantifier::Exactly(n)
        | RepetitionQuantifier::AtLeast(n)
        | RepetitionQuantifier::AtMost(n) => Some(n),
        // min <= max already holds
        RepetitionQuantifier::Range(_, max) => Some(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_MAX_QUANTIFIER_BOUND;

    fn validate(raw: RawQuantifier) -> Result<RepetitionQuantifier> {
        validate_quantifier(&raw, DEFAULT_MAX_QUANTIFIER_BOUND)
    }

    #[test]
    fn test_symbolic_quantifiers() {
        assert_eq!(
            validate(RawQuantifier::ZeroOrMore),
            Ok(RepetitionQuantifier::ZeroOrMore)
        );
        assert_eq!(
            validate(RawQuantifier::OneOrMore),
            Ok(RepetitionQuantifier::OneOrMore)
        );
        assert_eq!(
            validate(RawQuantifier::AtMostOne),
            Ok(RepetitionQuantifier::ZeroOrOne)
        );
    }

    #[test]
    fn test_counted_quantifiers() {
        assert_eq!(
            validate(RawQuantifier::Exactly(3)),
            Ok(RepetitionQuantifier::Exactly(3))
        );
        assert_eq!(
            validate(RawQuantifier::AtLeast(0)),
            Ok(RepetitionQuantifier::AtLeast(0))
        );
        assert_eq!(
            validate(RawQuantifier::AtMost(2)),
            Ok(RepetitionQuantifier::AtMost(2))
        );
        assert_eq!(
            validate(RawQuantifier::Range(0, 1)),
            Ok(RepetitionQuantifier::Range(0, 1))
        );
        assert_eq!(
            validate(RawQuantifier::Range(4, 4)),
            Ok(RepetitionQuantifier::Range(4, 4))
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            validate(RawQuantifier::Range(5, 2)),
            Err(CompileError::InvalidQuantifierRange { min: 5, max: 2 })
        );
    }

    #[test]
    fn test_empty_range_rejected() {
        assert_eq!(
            validate(RawQuantifier::Range(0, 0)),
            Err(CompileError::EmptyQuantifierRange {
                quantifier: "{0,0}".to_string()
            })
        );
    }

    #[test]
    fn test_zero_exactly_and_at_most_rejected() {
        assert_eq!(
            validate(RawQuantifier::Exactly(0)),
            Err(CompileError::EmptyQuantifierRange {
                quantifier: "{0}".to_string()
            })
        );
        assert_eq!(
            validate(RawQuantifier::AtMost(0)),
            Err(CompileError::EmptyQuantifierRange {
                quantifier: "{,0}".to_string()
            })
        );
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(
            validate(RawQuantifier::Exactly(100_001)),
            Err(CompileError::QuantifierOutOfBounds {
                count: 100_001,
                max: 100_000
            })
        );
        assert_eq!(
            validate(RawQuantifier::Range(1, 200_000)),
            Err(CompileError::QuantifierOutOfBounds {
                count: 200_000,
                max: 100_000
            })
        );
        assert!(validate(RawQuantifier::AtLeast(100_000)).is_ok());
    }

    #[test]
    fn test_range_checks_precede_bound_check() {
        // Inverted and oversized: the range error wins.
        assert_eq!(
            validate(RawQuantifier::Range(300_000, 200_000)),
            Err(CompileError::InvalidQuantifierRange {
                min: 300_000,
                max: 200_000
            })
        );
    }

    #[test]
    fn test_custom_bound() {
        assert!(validate_quantifier(&RawQuantifier::Exactly(11), 10).is_err());
        assert!(validate_quantifier(&RawQuantifier::Exactly(10), 10).is_ok());
        assert!(validate_quantifier(&RawQuantifier::OneOrMore, 0).is_ok());
    }
}
