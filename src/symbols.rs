// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Pattern variable symbol table.
//!
//! Collects every variable named in `PATTERN` (depth-first, source order,
//! `PERMUTE` members in listed order) and then every name in `DEFINE`,
//! normalizing and deduplicating as it goes. Anchors are never entered.
//!
//! # Ordering
//!
//! The table is insertion-ordered: augmented schema columns, compiled
//! definitions, and runtime symbol indices all follow left-to-right source
//! order, so compiling the same clause twice yields identical output.
//!
//! # Undeclared definitions
//!
//! A variable used in `PATTERN` without a `DEFINE` entry is valid and always
//! matches. The converse, a `DEFINE` for a variable the pattern never
//! mentions, can never take effect and fails with `UndeclaredDefinition`.

use rustc_hash::{FxHashMap, FxHashSet};
use sqlparser::ast::{MatchRecognizePattern as RawPattern, MatchRecognizeSymbol as RawSymbol};
use sqlparser::ast::SymbolDefinition as RawDefinition;
use tracing::debug;

use crate::common::ident::IdentNormalizer;
use crate::error::{CompileError, Result};

/// Insertion-ordered set of normalized pattern variable names.
///
/// Each name's position is a stable zero-based index the runtime can use in
/// place of string comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` if absent. Returns its index and whether it was new.
    pub fn insert(&mut self, name: String) -> (usize, bool) {
        if let Some(&idx) = self.index.get(&name) {
            return (idx, false);
        }
        let idx = self.names.len();
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        (idx, true)
    }

    /// Returns true if `name` is in the table.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the index assigned to `name`.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Names in insertion order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the table holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&String) -> &str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter().map(String::as_str)
    }
}

/// Builds the symbol table from the parsed pattern and `DEFINE` entries.
///
/// The pattern walk uses an explicit stack, so it cannot overflow on deeply
/// nested input.
///
/// # Errors
///
/// - `UndeclaredDefinition` if a `DEFINE` name does not occur in the pattern.
/// - `DuplicateDefinition` if two `DEFINE` entries normalize to one name.
pub fn build_symbol_table<N>(
    pattern: &RawPattern,
    definitions: &[RawDefinition],
    normalizer: &N,
) -> Result<SymbolTable>
where
    N: IdentNormalizer + ?Sized,
{
    let mut table = SymbolTable::new();

    let mut stack = vec![pattern];
    while let Some(node) = stack.pop() {
        match node {
            RawPattern::Symbol(symbol) | RawPattern::Exclude(symbol) => {
                insert_named(&mut table, symbol, normalizer);
            }
            RawPattern::Permute(symbols) => {
                for symbol in symbols {
                    insert_named(&mut table, symbol, normalizer);
                }
            }
            RawPattern::Concat(items) | RawPattern::Alternation(items) => {
                // reversed so the leftmost child is visited first
                stack.extend(items.iter().rev());
            }
            RawPattern::Group(inner) | RawPattern::Repetition(inner, _) => stack.push(inner),
        }
    }
    let referenced = table.len();

    let mut defined: FxHashSet<String> = FxHashSet::default();
    for definition in definitions {
        let name = normalizer.normalize(&definition.symbol);
        let (idx, _) = table.insert(name.clone());
        if idx >= referenced {
            return Err(CompileError::UndeclaredDefinition { symbol: name });
        }
        if !defined.insert(name.clone()) {
            return Err(CompileError::DuplicateDefinition { symbol: name });
        }
    }

    debug!(
        symbols = table.len(),
        definitions = definitions.len(),
        "built pattern symbol table"
    );
    Ok(table)
}

fn insert_named<N>(table: &mut SymbolTable, symbol: &RawSymbol, normalizer: &N)
where
    N: IdentNormalizer + ?Sized,
{
    if let RawSymbol::Named(ident) = symbol {
        table.insert(normalizer.normalize(ident));
    }
}
