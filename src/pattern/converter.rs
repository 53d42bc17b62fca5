// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Recursive conversion of the parsed `PATTERN` into a [`Pattern`].
//!
//! Each surface node maps to exactly one compiled node; no child is dropped
//! or reordered. On the way down the converter enforces what the grammar
//! itself cannot:
//!
//! - every quantifier passes [`validate_quantifier`],
//! - `PERMUTE` members are pairwise distinct (after normalization),
//! - anchors appear only as the first (`^`) or last (`$`) element of the
//!   top-level concatenation, never quantified, permuted, or excluded,
//! - nesting stays within [`CompileOptions::max_pattern_depth`].
//!
//! # Reluctant quantifiers
//!
//! `sqlparser` reads `A+?` as a `?` repetition wrapped around `A+`. The
//! converter folds a `?` that directly follows another quantifier into that
//! quantifier's reluctant flag, so `A+?` becomes one reluctant `+` and `A??`
//! a reluctant `?`. A parenthesized operand is not folded: `(A+)?` stays an
//! optional group.

use rustc_hash::FxHashSet;
use sqlparser::ast::{
    MatchRecognizePattern as RawPattern, MatchRecognizeSymbol as RawSymbol,
    RepetitionQuantifier as RawQuantifier,
};
use tracing::trace;

use crate::common::ident::IdentNormalizer;
use crate::error::{AnchorContext, CompileError, Result};
use crate::options::CompileOptions;
use crate::pattern::quantifier::validate_quantifier;
use crate::pattern::tree::{Pattern, PatternSymbol, Quantifier};

/// Which anchors a node may be, given its position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    /// An element of the top-level concatenation.
    Edge { first: bool, last: bool },
    /// Anywhere below the top level.
    Interior,
    /// The operand of a quantifier, possibly through groups.
    Quantified,
}

/// Converts parsed patterns using a fixed normalizer and set of limits.
#[derive(Debug)]
pub struct PatternConverter<'a, N: ?Sized> {
    normalizer: &'a N,
    options: &'a CompileOptions,
}

impl<'a, N> PatternConverter<'a, N>
where
    N: IdentNormalizer + ?Sized,
{
    /// Creates a converter.
    pub const fn new(normalizer: &'a N, options: &'a CompileOptions) -> Self {
        Self {
            normalizer,
            options,
        }
    }

    /// Converts a complete `PATTERN` clause.
    pub fn convert(&self, raw: &RawPattern) -> Result<Pattern> {
        match raw {
            RawPattern::Concat(items) => {
                self.check_depth(1)?;
                let last = items.len().saturating_sub(1);
                let converted = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let site = Site::Edge {
                            first: i == 0,
                            last: i == last,
                        };
                        self.convert_node(item, 2, site)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Pattern::Concat(converted))
            }
            other => self.convert_node(
                other,
                1,
                Site::Edge {
                    first: true,
                    last: true,
                },
            ),
        }
    }

    fn convert_node(&self, raw: &RawPattern, depth: usize, site: Site) -> Result<Pattern> {
        self.check_depth(depth)?;

        let pattern = match raw {
            RawPattern::Symbol(symbol) => Pattern::Symbol(self.symbol_at(symbol, site)?),
            RawPattern::Exclude(symbol) => {
                Pattern::Exclude(self.member_symbol(symbol, AnchorContext::InsideExclusion)?)
            }
            RawPattern::Permute(symbols) => Pattern::Permute(self.permute_members(symbols)?),
            RawPattern::Concat(items) => Pattern::Concat(self.convert_all(items, depth)?),
            RawPattern::Alternation(items) => {
                Pattern::Alternation(self.convert_all(items, depth)?)
            }
            RawPattern::Group(inner) => {
                // Parentheses do not lift a quantified anchor out of the quantifier.
                let inner_site = if site == Site::Quantified {
                    Site::Quantified
                } else {
                    Site::Interior
                };
                Pattern::Group(Box::new(self.convert_node(inner, depth + 1, inner_site)?))
            }
            RawPattern::Repetition(..) => self.convert_repetition(raw, depth)?,
        };

        trace!(depth, pattern = %pattern, "converted pattern node");
        Ok(pattern)
    }

    fn convert_all(&self, items: &[RawPattern], depth: usize) -> Result<Vec<Pattern>> {
        items
            .iter()
            .map(|item| self.convert_node(item, depth + 1, Site::Interior))
            .collect()
    }

    /// Converts a chain of directly nested repetitions, folding each `?` that
    /// immediately follows a quantifier into that quantifier's reluctant flag.
    fn convert_repetition(&self, raw: &RawPattern, depth: usize) -> Result<Pattern> {
        let mut quantifiers: Vec<&RawQuantifier> = Vec::new();
        let mut operand = raw;
        while let RawPattern::Repetition(inner, quantifier) = operand {
            quantifiers.push(quantifier);
            operand = inner;
        }
        // innermost first
        quantifiers.reverse();

        let mut pattern =
            self.convert_node(operand, depth + quantifiers.len(), Site::Quantified)?;

        let mut chain = quantifiers.into_iter().peekable();
        while let Some(raw_quantifier) = chain.next() {
            let bound = validate_quantifier(raw_quantifier, self.options.max_quantifier_bound)?;
            let reluctant = chain
                .next_if(|next| matches!(next, RawQuantifier::AtMostOne))
                .is_some();
            pattern = Pattern::Repetition(Box::new(pattern), Quantifier { bound, reluctant });
        }
        Ok(pattern)
    }

    fn symbol_at(&self, raw: &RawSymbol, site: Site) -> Result<PatternSymbol> {
        let symbol = self.symbol(raw);
        let allowed = match (&symbol, site) {
            (PatternSymbol::Named(_), _) => true,
            (PatternSymbol::Start, Site::Edge { first, .. }) => first,
            (PatternSymbol::End, Site::Edge { last, .. }) => last,
            (PatternSymbol::Start | PatternSymbol::End, Site::Interior | Site::Quantified) => {
                false
            }
        };
        if allowed {
            return Ok(symbol);
        }
        let context = if site == Site::Quantified {
            AnchorContext::Quantified
        } else {
            AnchorContext::NotAtBoundary
        };
        Err(CompileError::InvalidAnchorPosition {
            anchor: symbol,
            context,
        })
    }

    fn member_symbol(&self, raw: &RawSymbol, context: AnchorContext) -> Result<PatternSymbol> {
        let symbol = self.symbol(raw);
        if symbol.is_anchor() {
            return Err(CompileError::InvalidAnchorPosition {
                anchor: symbol,
                context,
            });
        }
        Ok(symbol)
    }

    fn permute_members(&self, raw: &[RawSymbol]) -> Result<Vec<PatternSymbol>> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut members = Vec::with_capacity(raw.len());
        for member in raw {
            let symbol = self.member_symbol(member, AnchorContext::InsidePermute)?;
            if let PatternSymbol::Named(name) = &symbol {
                if !seen.insert(name.clone()) {
                    return Err(CompileError::DuplicatePermuteSymbol {
                        symbol: name.clone(),
                    });
                }
            }
            members.push(symbol);
        }
        Ok(members)
    }

    fn symbol(&self, raw: &RawSymbol) -> PatternSymbol {
        match raw {
            RawSymbol::Named(ident) => PatternSymbol::Named(self.normalizer.normalize(ident)),
            RawSymbol::Start => PatternSymbol::Start,
            RawSymbol::End => PatternSymbol::End,
        }
    }

    const fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.options.max_pattern_depth {
            return Err(CompileError::PatternTooDeep {
                limit: self.options.max_pattern_depth,
            });
        }
        Ok(())
    }
}

/// Converts `raw` with the given normalizer and limits.
///
/// # Examples
///
/// ```
/// use rowpattern::common::ident::CaseFoldNormalizer;
/// use rowpattern::options::CompileOptions;
/// use rowpattern::pattern::converter::convert_pattern;
/// use sqlparser::ast::{Ident, MatchRecognizePattern, MatchRecognizeSymbol, RepetitionQuantifier};
///
/// let raw = MatchRecognizePattern::Repetition(
///     Box::new(MatchRecognizePattern::Symbol(MatchRecognizeSymbol::Named(Ident::new("Up")))),
///     RepetitionQuantifier::OneOrMore,
/// );
/// let normalizer = CaseFoldNormalizer::default();
/// let pattern = convert_pattern(&raw, &normalizer, &CompileOptions::default()).unwrap();
/// assert_eq!(pattern.to_string(), "up+");
/// ```
pub fn convert_pattern<N>(
    raw: &RawPattern,
    normalizer: &N,
    options: &CompileOptions,
) -> Result<Pattern>
where
    N: IdentNormalizer + ?Sized,
{
    PatternConverter::new(normalizer, options).convert(raw)
}
