// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! # `rowpattern`: `MATCH_RECOGNIZE` Row Pattern Compiler
//!
//! Compiles the SQL row pattern recognition clause (`PATTERN`, `DEFINE`,
//! `MEASURES`, `SUBSET`, `ROWS PER MATCH`, `AFTER MATCH SKIP`) from the
//! [`sqlparser`] AST into a validated, normalized form that a row matching
//! engine can execute. The crate does no matching itself.
//!
//! ## Pipeline
//!
//! | Stage | Module | Produces |
//! |-------|--------|----------|
//! | Quantifier validation | [`pattern::quantifier`] | `RepetitionQuantifier` |
//! | Pattern conversion | [`pattern::converter`] | [`Pattern`] |
//! | Symbol table | [`symbols`] | [`SymbolTable`] in source order |
//! | Schema augmentation | [`schema`] | [`AugmentedSchema`] with `var.col` fields |
//! | Expression binding | [`binder`] | bound `DEFINE` / `MEASURES` |
//! | Clause assembly | [`match_recognize`] | [`CompiledMatchRecognize`] |
//!
//! Expressions are planned by an [`ExprPlanner`] supplied by the embedder;
//! [`ScalarPlanner`] is a self-contained reference implementation.
//!
//! ## Quick Start
//!
//! ```
//! use arrow_schema::{DataType, Field, Schema};
//! use rowpattern::{compile, MatchRecognizeClause, RowSchema};
//! use sqlparser::ast::{Ident, MatchRecognizePattern, MatchRecognizeSymbol, RepetitionQuantifier};
//!
//! let pattern = MatchRecognizePattern::Repetition(
//!     Box::new(MatchRecognizePattern::Symbol(MatchRecognizeSymbol::Named(Ident::new("Up")))),
//!     RepetitionQuantifier::OneOrMore,
//! );
//! let fields = vec![Field::new("price", DataType::Float64, false)];
//! let base = RowSchema::new(None, &Schema::new(fields));
//!
//! let compiled = compile(&MatchRecognizeClause::new(pattern), &base).unwrap();
//! assert_eq!(compiled.pattern().to_string(), "up+");
//! assert!(!compiled.definition("up").unwrap().explicit);
//! ```
//!
//! ## Logging
//!
//! Stage boundaries are logged at `debug` and individual pattern nodes at
//! `trace` through [`tracing`]. The crate never installs a subscriber.

pub mod binder;
pub mod common;
pub mod error;
pub mod match_recognize;
pub mod options;
pub mod pattern;
pub mod planner;
pub mod schema;
pub mod symbols;

pub use error::{CompileError, Result};
pub use match_recognize::{
    compile, AfterMatchSkip, CompiledMatchRecognize, MatchRecognizeClause, MatchRecognizeCompiler,
    RowsPerMatch,
};
pub use options::CompileOptions;
pub use pattern::tree::{Pattern, PatternSymbol};
pub use planner::{ExprPlanner, PlanError, ScalarExpr, ScalarPlanner};
pub use schema::{AugmentedSchema, RowSchema};
pub use symbols::SymbolTable;
