// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Compiled row pattern tree.
//!
//! [`Pattern`] is a closed sum type: adding a construct forces the converter,
//! the printer, and every other consumer to handle it. Printing reproduces
//! surface syntax that parses back to an equivalent tree, inserting
//! parentheses only where operator precedence requires them. Variable names
//! that would fold or tokenize differently when unquoted are printed as
//! quoted identifiers.
//!
//! One exception: `sqlparser` reads a `{` that directly follows a symbol as
//! the start of a `{n,m}` quantifier, so a printed `a {- b -}` does not
//! parse back. An exclusion at the start of a concatenation or alternative
//! (`{- b -} c`) does.

use std::fmt;

/// A position in the pattern: a pattern variable or a partition anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSymbol {
    /// A pattern variable, by normalized name.
    Named(String),
    /// Start of partition (`^`).
    Start,
    /// End of partition (`$`).
    End,
}

impl PatternSymbol {
    /// Returns the variable name, or `None` for anchors.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Start | Self::End => None,
        }
    }

    /// Returns true for `^` and `$`.
    #[must_use]
    pub const fn is_anchor(&self) -> bool {
        matches!(self, Self::Start | Self::End)
    }
}

/// Whether `name` reads back unchanged as an unquoted identifier.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for PatternSymbol {
    /// Lowercase identifiers print bare; anything else prints double-quoted
    /// with embedded quotes doubled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) if is_plain_identifier(name) => f.write_str(name),
            Self::Named(name) => write!(f, "\"{}\"", name.replace('"', "\"\"")),
            Self::Start => f.write_str("^"),
            Self::End => f.write_str("$"),
        }
    }
}

/// A validated repetition bound.
///
/// `Exactly(n)` has `n >= 1`; `Range(n, m)` has `n <= m` and `m >= 1`.
/// Construct through the quantifier validator to uphold these invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepetitionQuantifier {
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `?`
    ZeroOrOne,
    /// `{n}`
    Exactly(u32),
    /// `{n,}`
    AtLeast(u32),
    /// `{,n}`
    AtMost(u32),
    /// `{n,m}`
    Range(u32, u32),
}

impl RepetitionQuantifier {
    /// Minimum number of repetitions.
    #[must_use]
    pub const fn min(self) -> u32 {
        match self {
            Self::ZeroOrMore | Self::ZeroOrOne | Self::AtMost(_) => 0,
            Self::OneOrMore => 1,
            Self::Exactly(n) | Self::AtLeast(n) | Self::Range(n, _) => n,
        }
    }

    /// Maximum number of repetitions, `None` when unbounded.
    #[must_use]
    pub const fn max(self) -> Option<u32> {
        match self {
            Self::ZeroOrMore | Self::OneOrMore | Self::AtLeast(_) => None,
            Self::ZeroOrOne => Some(1),
            Self::Exactly(n) | Self::AtMost(n) | Self::Range(_, n) => Some(n),
        }
    }
}

impl fmt::Display for RepetitionQuantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroOrMore => f.write_str("*"),
            Self::OneOrMore => f.write_str("+"),
            Self::ZeroOrOne => f.write_str("?"),
            Self::Exactly(n) => write!(f, "{{{n}}}"),
            Self::AtLeast(n) => write!(f, "{{{n},}}"),
            Self::AtMost(n) => write!(f, "{{,{n}}}"),
            Self::Range(min, max) => write!(f, "{{{min},{max}}}"),
        }
    }
}

/// A repetition bound plus its match-order preference.
///
/// Reluctance (`?` suffix) only changes which match the runtime prefers; it
/// never affects validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantifier {
    /// The validated bound.
    pub bound: RepetitionQuantifier,
    /// True for reluctant (`A+?`), false for greedy (`A+`).
    pub reluctant: bool,
}

impl Quantifier {
    /// A greedy quantifier.
    #[must_use]
    pub const fn greedy(bound: RepetitionQuantifier) -> Self {
        Self {
            bound,
            reluctant: false,
        }
    }

    /// A reluctant quantifier.
    #[must_use]
    pub const fn reluctant(bound: RepetitionQuantifier) -> Self {
        Self {
            bound,
            reluctant: true,
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bound)?;
        if self.reluctant {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// A compiled row pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// A single symbol.
    Symbol(PatternSymbol),
    /// A symbol whose rows are matched but left out of `ALL ROWS PER MATCH`
    /// output (`{- A -}`).
    Exclude(PatternSymbol),
    /// Every permutation of the listed symbols, each exactly once.
    Permute(Vec<PatternSymbol>),
    /// Sequential composition.
    Concat(Vec<Pattern>),
    /// Parenthesized sub-pattern. Transparent for matching.
    Group(Box<Pattern>),
    /// First branch that matches wins, in source order.
    Alternation(Vec<Pattern>),
    /// The sub-pattern repeated within the quantifier's bound.
    Repetition(Box<Pattern>, Quantifier),
}

/// Binding strength used when printing, weakest first.
const PREC_ALTERNATION: u8 = 0;
const PREC_CONCAT: u8 = 1;
const PREC_REPETITION: u8 = 2;
const PREC_PRIMARY: u8 = 3;

impl Pattern {
    /// Returns a copy with every `Group` wrapper removed.
    ///
    /// Useful for comparing structure when the source parenthesization is
    /// irrelevant. Printing the result re-inserts the parentheses precedence
    /// needs.
    #[must_use]
    pub fn without_groups(&self) -> Self {
        match self {
            Self::Group(inner) => inner.without_groups(),
            Self::Symbol(_) | Self::Exclude(_) | Self::Permute(_) => self.clone(),
            Self::Concat(items) => Self::Concat(items.iter().map(Self::without_groups).collect()),
            Self::Alternation(items) => {
                Self::Alternation(items.iter().map(Self::without_groups).collect())
            }
            Self::Repetition(inner, quantifier) => {
                Self::Repetition(Box::new(inner.without_groups()), *quantifier)
            }
        }
    }

    /// Named symbols in depth-first source order, duplicates included.
    #[must_use]
    pub fn named_symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Symbol(symbol) | Self::Exclude(symbol) => out.extend(symbol.name()),
            Self::Permute(symbols) => out.extend(symbols.iter().filter_map(PatternSymbol::name)),
            Self::Concat(items) | Self::Alternation(items) => {
                for item in items {
                    item.collect_named(out);
                }
            }
            Self::Group(inner) | Self::Repetition(inner, _) => inner.collect_named(out),
        }
    }

    /// Nesting depth; a lone symbol has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Symbol(_) | Self::Exclude(_) | Self::Permute(_) => 1,
            Self::Concat(items) | Self::Alternation(items) => {
                1 + items.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::Group(inner) | Self::Repetition(inner, _) => 1 + inner.depth(),
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Alternation(_) => PREC_ALTERNATION,
            Self::Concat(_) => PREC_CONCAT,
            Self::Repetition(..) => PREC_REPETITION,
            Self::Symbol(_) | Self::Exclude(_) | Self::Permute(_) | Self::Group(_) => {
                PREC_PRIMARY
            }
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        if self.precedence() < min_prec {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Exclude(symbol) => write!(f, "{{- {symbol} -}}"),
            Self::Permute(symbols) => {
                f.write_str("PERMUTE(")?;
                for (i, symbol) in symbols.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{symbol}")?;
                }
                f.write_str(")")
            }
            Self::Concat(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    item.fmt_operand(f, PREC_REPETITION)?;
                }
                Ok(())
            }
            Self::Alternation(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    item.fmt_operand(f, PREC_CONCAT)?;
                }
                Ok(())
            }
            Self::Group(inner) => write!(f, "({inner})"),
            Self::Repetition(inner, quantifier) => {
                // A nested repetition is always parenthesized so that a
                // trailing `?` cannot be re-read as a reluctance marker.
                inner.fmt_operand(f, PREC_PRIMARY)?;
                write!(f, "{quantifier}")
            }
        }
    }
}
