// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Identifier normalization.
//!
//! Pattern variables, subset names, measure aliases, and column references
//! all pass through one [`IdentNormalizer`], so `PATTERN (a) DEFINE A AS ...`
//! names a single variable whenever the normalizer folds case.

use sqlparser::ast::Ident;

/// Turns a parsed identifier into the canonical name used for lookups.
pub trait IdentNormalizer {
    /// Returns the canonical form of `ident`.
    fn normalize(&self, ident: &Ident) -> String;
}

impl<F> IdentNormalizer for F
where
    F: Fn(&Ident) -> String,
{
    fn normalize(&self, ident: &Ident) -> String {
        self(ident)
    }
}

/// Standard SQL folding: unquoted identifiers are lowercased, quoted ones are
/// kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseFoldNormalizer {
    enabled: bool,
}

impl CaseFoldNormalizer {
    /// Creates a normalizer. With `enabled = false` every identifier is kept
    /// exactly as written.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Returns true if unquoted identifiers are folded to lowercase.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for CaseFoldNormalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IdentNormalizer for CaseFoldNormalizer {
    fn normalize(&self, ident: &Ident) -> String {
        if self.enabled && ident.quote_style.is_none() {
            ident.value.to_lowercase()
        } else {
            ident.value.clone()
        }
    }
}
