// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! The row pattern language of `MATCH_RECOGNIZE`.
//!
//! Converts the `PATTERN` clause parsed by `sqlparser` into a validated
//! [`tree::Pattern`].
//!
//! # Pattern Syntax
//!
//! ```text
//! A B C          : Concatenation: rows matching A, then B, then C
//! A | B          : Alternation: A, else B (first branch wins)
//! ( ... )        : Grouping
//! A* A+ A?       : Zero or more, one or more, zero or one
//! A{n} A{n,}     : Exactly n, at least n
//! A{,m} A{n,m}   : At most m, between n and m
//! A+?            : Any quantifier followed by ? is reluctant
//! PERMUTE(A, B)  : A and B in either order, each exactly once
//! {- A -}        : Match A but exclude its rows from ALL ROWS PER MATCH output
//! ^  $           : Start / end of partition (pattern boundaries only)
//! ```
//!
//! `sqlparser` takes a `{` right after a symbol as a quantifier, so `a {- b -}`
//! is rejected at parse time while `{- b -} a` is accepted. Printed patterns
//! inherit the same restriction.

pub mod converter;
pub mod quantifier;
pub mod tree;
