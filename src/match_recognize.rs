// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! `MATCH_RECOGNIZE` clause compilation.
//!
//! [`MatchRecognizeCompiler`] runs the whole pipeline in a single pass and
//! either returns an immutable [`CompiledMatchRecognize`] or the first error:
//!
//! ```text
//! PATTERN            -> convert + validate quantifiers/anchors/PERMUTE
//! PATTERN + DEFINE   -> symbol table (source order)
//! SUBSET             -> union variables over the symbol table
//! base schema        -> augmented schema (one nullable copy per variable)
//! PARTITION/ORDER BY -> planned against the base schema
//! DEFINE             -> planned, owner qualifier stripped
//! MEASURES           -> planned
//! ROWS PER MATCH, AFTER MATCH SKIP -> policies, skip target checked
//! ```
//!
//! Nothing is cached between calls and the compiler holds no mutable state,
//! so one compiler can be shared across threads when its planner and
//! normalizer can.
//!
//! # Example
//!
//! ```
//! use arrow_schema::{DataType, Field, Schema};
//! use rowpattern::match_recognize::{compile, MatchRecognizeClause};
//! use rowpattern::schema::RowSchema;
//! use sqlparser::ast::Statement;
//! use sqlparser::dialect::GenericDialect;
//! use sqlparser::parser::Parser;
//!
//! let sql = "SELECT * FROM ticks MATCH_RECOGNIZE (
//!     ORDER BY ts
//!     MEASURES LAST(up.price) AS top
//!     PATTERN (strt down+ up+)
//!     DEFINE down AS price < PREV(price), up AS price > PREV(price)
//! )";
//! let statement = Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0);
//! let Statement::Query(query) = statement else { unreachable!() };
//! let sqlparser::ast::SetExpr::Select(select) = *query.body else { unreachable!() };
//! let factor = select.from[0].relation.clone();
//! let clause = MatchRecognizeClause::from_table_factor(factor).unwrap();
//!
//! let base = RowSchema::new(None, &Schema::new(vec![
//!     Field::new("ts", DataType::Int64, false),
//!     Field::new("price", DataType::Float64, false),
//! ]));
//! let compiled = compile(&clause, &base).unwrap();
//! assert_eq!(compiled.pattern().to_string(), "strt down+ up+");
//! assert_eq!(compiled.symbols().names(), ["strt", "down", "up"]);
//! ```

use std::fmt;

use rustc_hash::FxHashSet;
use sqlparser::ast::{
    AfterMatchSkip as RawAfterMatchSkip, EmptyMatchesMode as RawEmptyMatchesMode, Expr, Ident,
    MatchRecognizePattern as RawPattern, Measure, OrderByExpr, RowsPerMatch as RawRowsPerMatch,
    SymbolDefinition as RawDefinition, TableFactor,
};
use tracing::debug;

use crate::binder::{bind_definitions, bind_measures, BoundMeasure, SymbolDefinition};
use crate::common::ident::{CaseFoldNormalizer, IdentNormalizer};
use crate::error::{BindingContext, CompileError, Result};
use crate::options::CompileOptions;
use crate::pattern::converter::convert_pattern;
use crate::pattern::tree::Pattern;
use crate::planner::{ExprPlanner, ScalarExpr, ScalarPlanner};
use crate::schema::{augment_schema, AugmentedSchema, RowSchema};
use crate::symbols::{build_symbol_table, SymbolTable};

/// An `ORDER BY` key as written.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Key expression.
    pub expr: Expr,
    /// `ASC` / `DESC`; `None` when omitted.
    pub asc: Option<bool>,
    /// `NULLS FIRST` / `NULLS LAST`; `None` when omitted.
    pub nulls_first: Option<bool>,
}

impl From<OrderByExpr> for SortKey {
    fn from(key: OrderByExpr) -> Self {
        Self {
            expr: key.expr,
            asc: key.options.asc,
            nulls_first: key.options.nulls_first,
        }
    }
}

/// A `SUBSET name = (a, b, ...)` entry as written.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetDefinition {
    /// Union variable name.
    pub name: Ident,
    /// Member pattern variables.
    pub symbols: Vec<Ident>,
}

/// A parsed `MATCH_RECOGNIZE` clause, before compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecognizeClause {
    /// `PARTITION BY` expressions.
    pub partition_by: Vec<Expr>,
    /// `ORDER BY` keys.
    pub order_by: Vec<SortKey>,
    /// `MEASURES` entries.
    pub measures: Vec<Measure>,
    /// `ONE ROW` / `ALL ROWS PER MATCH`; `None` when omitted.
    pub rows_per_match: Option<RawRowsPerMatch>,
    /// `AFTER MATCH SKIP`; `None` when omitted.
    pub after_match_skip: Option<RawAfterMatchSkip>,
    /// `PATTERN`.
    pub pattern: RawPattern,
    /// `SUBSET` entries.
    pub subsets: Vec<SubsetDefinition>,
    /// `DEFINE` entries.
    pub definitions: Vec<RawDefinition>,
}

impl MatchRecognizeClause {
    /// A clause with only a pattern; every other part empty or defaulted.
    #[must_use]
    pub const fn new(pattern: RawPattern) -> Self {
        Self {
            partition_by: Vec::new(),
            order_by: Vec::new(),
            measures: Vec::new(),
            rows_per_match: None,
            after_match_skip: None,
            pattern,
            subsets: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// Lifts the clause out of a parsed `TableFactor::MatchRecognize`.
    ///
    /// Returns `None` for any other table factor.
    #[must_use]
    pub fn from_table_factor(factor: TableFactor) -> Option<Self> {
        match factor {
            TableFactor::MatchRecognize {
                partition_by,
                order_by,
                measures,
                rows_per_match,
                after_match_skip,
                pattern,
                symbols,
                ..
            } => Some(Self {
                partition_by,
                order_by: order_by.into_iter().map(SortKey::from).collect(),
                measures,
                rows_per_match,
                after_match_skip,
                pattern,
                subsets: Vec::new(),
                definitions: symbols,
            }),
            _ => None,
        }
    }

    /// Adds a `SUBSET` entry.
    #[must_use]
    pub fn with_subset(mut self, name: Ident, symbols: Vec<Ident>) -> Self {
        self.subsets.push(SubsetDefinition { name, symbols });
        self
    }
}

/// How `ALL ROWS PER MATCH` treats empty matches and unmatched rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmptyMatchesMode {
    /// Emit one row for each empty match.
    #[default]
    Show,
    /// Emit nothing for empty matches.
    Omit,
    /// Additionally emit every row that belongs to no match.
    WithUnmatched,
}

impl From<RawEmptyMatchesMode> for EmptyMatchesMode {
    fn from(mode: RawEmptyMatchesMode) -> Self {
        match mode {
            RawEmptyMatchesMode::Show => Self::Show,
            RawEmptyMatchesMode::Omit => Self::Omit,
            RawEmptyMatchesMode::WithUnmatched => Self::WithUnmatched,
        }
    }
}

impl fmt::Display for EmptyMatchesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Show => "SHOW EMPTY MATCHES",
            Self::Omit => "OMIT EMPTY MATCHES",
            Self::WithUnmatched => "WITH UNMATCHED ROWS",
        })
    }
}

/// Output cardinality per match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowsPerMatch {
    /// One summary row per match.
    #[default]
    OneRow,
    /// Every matched row.
    AllRows(EmptyMatchesMode),
}

impl From<RawRowsPerMatch> for RowsPerMatch {
    fn from(rows: RawRowsPerMatch) -> Self {
        match rows {
            RawRowsPerMatch::OneRow => Self::OneRow,
            RawRowsPerMatch::AllRows(mode) => {
                Self::AllRows(mode.map(Into::into).unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for RowsPerMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneRow => f.write_str("ONE ROW PER MATCH"),
            Self::AllRows(mode) => write!(f, "ALL ROWS PER MATCH {mode}"),
        }
    }
}

/// Where the next match attempt resumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AfterMatchSkip {
    /// The row after the last row of the match.
    #[default]
    PastLastRow,
    /// The row after the first row of the match.
    ToNextRow,
    /// The first row mapped to the variable or subset.
    ToFirst(String),
    /// The last row mapped to the variable or subset.
    ToLast(String),
}

impl AfterMatchSkip {
    /// The skip target, if the policy names one.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::ToFirst(symbol) | Self::ToLast(symbol) => Some(symbol),
            Self::PastLastRow | Self::ToNextRow => None,
        }
    }

    fn from_raw<N: IdentNormalizer + ?Sized>(raw: &RawAfterMatchSkip, normalizer: &N) -> Self {
        match raw {
            RawAfterMatchSkip::PastLastRow => Self::PastLastRow,
            RawAfterMatchSkip::ToNextRow => Self::ToNextRow,
            RawAfterMatchSkip::ToFirst(ident) => Self::ToFirst(normalizer.normalize(ident)),
            RawAfterMatchSkip::ToLast(ident) => Self::ToLast(normalizer.normalize(ident)),
        }
    }
}

impl fmt::Display for AfterMatchSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PastLastRow => f.write_str("AFTER MATCH SKIP PAST LAST ROW"),
            Self::ToNextRow => f.write_str("AFTER MATCH SKIP TO NEXT ROW"),
            Self::ToFirst(symbol) => write!(f, "AFTER MATCH SKIP TO FIRST {symbol}"),
            Self::ToLast(symbol) => write!(f, "AFTER MATCH SKIP TO LAST {symbol}"),
        }
    }
}

/// A validated `SUBSET` union variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubsetDef {
    /// Normalized subset name.
    pub name: String,
    /// Normalized members, in listed order, without duplicates.
    pub symbols: Vec<String>,
}

impl fmt::Display for SubsetDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ({})", self.name, self.symbols.join(", "))
    }
}

fn resolve_subsets<N>(
    raw: &[SubsetDefinition],
    symbols: &SymbolTable,
    normalizer: &N,
) -> Result<Vec<SubsetDef>>
where
    N: IdentNormalizer + ?Sized,
{
    let mut names: FxHashSet<String> = FxHashSet::default();
    let mut subsets = Vec::with_capacity(raw.len());

    for subset in raw {
        let name = normalizer.normalize(&subset.name);
        if symbols.contains(&name) || !names.insert(name.clone()) {
            return Err(CompileError::DuplicateSubset { name });
        }

        let mut members: Vec<String> = Vec::with_capacity(subset.symbols.len());
        for ident in &subset.symbols {
            let symbol = normalizer.normalize(ident);
            if !symbols.contains(&symbol) {
                return Err(CompileError::UnknownSubsetSymbol {
                    subset: name,
                    symbol,
                });
            }
            if !members.contains(&symbol) {
                members.push(symbol);
            }
        }
        subsets.push(SubsetDef {
            name,
            symbols: members,
        });
    }
    Ok(subsets)
}

/// A planned `ORDER BY` key with SQL defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSortKey<E> {
    /// Planned key expression.
    pub expr: E,
    /// Ascending order (the default).
    pub asc: bool,
    /// Nulls first; defaults to `!asc`, i.e. nulls sort as the largest value.
    pub nulls_first: bool,
}

/// The compiled, immutable form of a `MATCH_RECOGNIZE` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMatchRecognize<E> {
    partition_by: Vec<E>,
    order_by: Vec<BoundSortKey<E>>,
    measures: Vec<BoundMeasure<E>>,
    pattern: Pattern,
    symbols: SymbolTable,
    subsets: Vec<SubsetDef>,
    definitions: Vec<SymbolDefinition<E>>,
    rows_per_match: RowsPerMatch,
    after_match_skip: AfterMatchSkip,
    schema: AugmentedSchema,
}

impl<E> CompiledMatchRecognize<E> {
    /// Planned `PARTITION BY` keys.
    #[must_use]
    pub fn partition_by(&self) -> &[E] {
        &self.partition_by
    }

    /// Planned `ORDER BY` keys.
    #[must_use]
    pub fn order_by(&self) -> &[BoundSortKey<E>] {
        &self.order_by
    }

    /// Measures in declaration order.
    #[must_use]
    pub fn measures(&self) -> &[BoundMeasure<E>] {
        &self.measures
    }

    /// The compiled pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Pattern variables in source order.
    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// `SUBSET` union variables.
    #[must_use]
    pub fn subsets(&self) -> &[SubsetDef] {
        &self.subsets
    }

    /// One definition per pattern variable, in symbol-table order.
    #[must_use]
    pub fn definitions(&self) -> &[SymbolDefinition<E>] {
        &self.definitions
    }

    /// The definition of `symbol`.
    #[must_use]
    pub fn definition(&self, symbol: &str) -> Option<&SymbolDefinition<E>> {
        self.symbols
            .index_of(symbol)
            .and_then(|idx| self.definitions.get(idx))
    }

    /// Output cardinality policy.
    #[must_use]
    pub const fn rows_per_match(&self) -> RowsPerMatch {
        self.rows_per_match
    }

    /// Resume policy.
    #[must_use]
    pub const fn after_match_skip(&self) -> &AfterMatchSkip {
        &self.after_match_skip
    }

    /// The augmented schema `DEFINE` and `MEASURES` were planned against.
    #[must_use]
    pub const fn schema(&self) -> &AugmentedSchema {
        &self.schema
    }
}

/// Compiles [`MatchRecognizeClause`]s with a fixed planner, normalizer, and
/// set of limits.
///
/// The normalizer applies to every identifier in the clause. It is handed
/// to the planner for column references, so `A.price` in `DEFINE` folds the
/// same way as `A` in `PATTERN`.
#[derive(Debug, Clone)]
pub struct MatchRecognizeCompiler<P, N = CaseFoldNormalizer> {
    planner: P,
    normalizer: N,
    options: CompileOptions,
}

impl<P: ExprPlanner> MatchRecognizeCompiler<P> {
    /// Creates a compiler with the default normalizer and options.
    pub fn new(planner: P) -> Self {
        Self {
            planner,
            normalizer: CaseFoldNormalizer::default(),
            options: CompileOptions::default(),
        }
    }
}

impl<P, N> MatchRecognizeCompiler<P, N>
where
    P: ExprPlanner,
    N: IdentNormalizer,
{
    /// Replaces the identifier normalizer used for symbols and columns alike.
    pub fn with_normalizer<M: IdentNormalizer>(
        self,
        normalizer: M,
    ) -> MatchRecognizeCompiler<P, M> {
        MatchRecognizeCompiler {
            planner: self.planner,
            normalizer,
            options: self.options,
        }
    }

    /// Replaces the compile options.
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// The compile options in effect.
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The expression planner.
    pub const fn planner(&self) -> &P {
        &self.planner
    }

    /// Compiles `clause` over rows of `base`.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] encountered; no partial result is
    /// produced.
    pub fn compile(
        &self,
        clause: &MatchRecognizeClause,
        base: &RowSchema,
    ) -> Result<CompiledMatchRecognize<P::Expr>> {
        debug!(
            partition_keys = clause.partition_by.len(),
            order_keys = clause.order_by.len(),
            measures = clause.measures.len(),
            definitions = clause.definitions.len(),
            subsets = clause.subsets.len(),
            "compiling MATCH_RECOGNIZE"
        );

        let pattern = convert_pattern(&clause.pattern, &self.normalizer, &self.options)?;
        debug!(pattern = %pattern, depth = pattern.depth(), "converted PATTERN");

        let symbols = build_symbol_table(&clause.pattern, &clause.definitions, &self.normalizer)?;
        let subsets = resolve_subsets(&clause.subsets, &symbols, &self.normalizer)?;
        let schema = augment_schema(
            base,
            &symbols,
            subsets.iter().map(|subset| subset.name.as_str()),
        )?;

        let (partition_by, order_by) = self.bind_keys(clause, base)?;
        let definitions = bind_definitions(
            &self.planner,
            &clause.definitions,
            &symbols,
            &schema,
            &self.normalizer,
        )?;
        let measures = bind_measures(&self.planner, &clause.measures, &schema, &self.normalizer)?;

        let rows_per_match = clause
            .rows_per_match
            .clone()
            .map(RowsPerMatch::from)
            .unwrap_or_default();
        let after_match_skip = clause
            .after_match_skip
            .as_ref()
            .map(|skip| AfterMatchSkip::from_raw(skip, &self.normalizer))
            .unwrap_or_default();
        if let Some(target) = after_match_skip.target() {
            if !symbols.contains(target) && !subsets.iter().any(|subset| subset.name == target) {
                return Err(CompileError::UnknownSkipTargetSymbol {
                    symbol: target.to_string(),
                });
            }
        }

        debug!(
            symbols = symbols.len(),
            definitions = definitions.len(),
            measures = measures.len(),
            augmented_fields = schema.len(),
            %rows_per_match,
            %after_match_skip,
            "compiled MATCH_RECOGNIZE"
        );

        Ok(CompiledMatchRecognize {
            partition_by,
            order_by,
            measures,
            pattern,
            symbols,
            subsets,
            definitions,
            rows_per_match,
            after_match_skip,
            schema,
        })
    }

    /// Plans `PARTITION BY` and `ORDER BY` against the base schema only.
    #[allow(clippy::type_complexity)]
    fn bind_keys(
        &self,
        clause: &MatchRecognizeClause,
        base: &RowSchema,
    ) -> Result<(Vec<P::Expr>, Vec<BoundSortKey<P::Expr>>)> {
        let schema = AugmentedSchema::from_base(base);

        let partition_by = clause
            .partition_by
            .iter()
            .enumerate()
            .map(|(idx, expr)| {
                self.planner
                    .plan(expr, &schema, &self.normalizer)
                    .map_err(|source| CompileError::plan(BindingContext::PartitionKey(idx), source))
            })
            .collect::<Result<Vec<_>>>()?;

        let order_by = clause
            .order_by
            .iter()
            .enumerate()
            .map(|(idx, key)| {
                let expr = self
                    .planner
                    .plan(&key.expr, &schema, &self.normalizer)
                    .map_err(|source| CompileError::plan(BindingContext::OrderKey(idx), source))?;
                let asc = key.asc.unwrap_or(true);
                Ok(BoundSortKey {
                    expr,
                    asc,
                    nulls_first: key.nulls_first.unwrap_or(!asc),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((partition_by, order_by))
    }
}

/// Compiles `clause` with the reference [`ScalarPlanner`] and default settings.
pub fn compile(
    clause: &MatchRecognizeClause,
    base: &RowSchema,
) -> Result<CompiledMatchRecognize<ScalarExpr>> {
    MatchRecognizeCompiler::new(ScalarPlanner::new()).compile(clause, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnchorContext;
    use crate::pattern::tree::{PatternSymbol, Quantifier, RepetitionQuantifier};
    use crate::planner::{ColumnRef, PlanError};
    use arrow_schema::{DataType, Field, Schema};
    use pretty_assertions::assert_eq;
    use sqlparser::ast::{SetExpr, Statement};
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn ticks() -> RowSchema {
        RowSchema::new(
            Some("ticks"),
            &Schema::new(vec![
                Field::new("symbol", DataType::Utf8, false),
                Field::new("ts", DataType::Int64, false),
                Field::new("price", DataType::Float64, false),
                Field::new("v", DataType::Int64, true),
            ]),
        )
    }

    /// Parses `SELECT * FROM ticks MATCH_RECOGNIZE (<body>)`.
    fn clause(body: &str) -> MatchRecognizeClause {
        let sql = format!("SELECT * FROM ticks MATCH_RECOGNIZE ({body})");
        let mut statements = Parser::parse_sql(&GenericDialect {}, &sql).unwrap();
        let Statement::Query(query) = statements.remove(0) else {
            panic!("expected a query");
        };
        let SetExpr::Select(select) = *query.body else {
            panic!("expected a select");
        };
        MatchRecognizeClause::from_table_factor(select.from[0].relation.clone()).unwrap()
    }

    fn compile_body(body: &str) -> Result<CompiledMatchRecognize<ScalarExpr>> {
        compile(&clause(body), &ticks())
    }

    fn named(name: &str) -> Pattern {
        Pattern::Symbol(PatternSymbol::Named(name.to_string()))
    }

    fn rep(inner: Pattern, bound: RepetitionQuantifier) -> Pattern {
        Pattern::Repetition(Box::new(inner), Quantifier::greedy(bound))
    }

    #[test]
    fn test_v_shape_end_to_end() {
        let compiled = compile_body(
            "PARTITION BY symbol
             ORDER BY ts
             MEASURES STRT.ts AS start_ts, LAST(DOWN.ts) AS bottom_ts, LAST(UP.price) AS top
             ONE ROW PER MATCH
             AFTER MATCH SKIP TO LAST UP
             PATTERN (STRT DOWN+ UP+)
             DEFINE DOWN AS DOWN.price < PREV(DOWN.price), UP AS price > PREV(price)",
        )
        .unwrap();

        assert_eq!(compiled.pattern().to_string(), "strt down+ up+");
        assert_eq!(compiled.symbols().names(), ["strt", "down", "up"]);
        assert_eq!(
            compiled.partition_by(),
            [ScalarExpr::Column(ColumnRef::bare("symbol"))]
        );
        assert_eq!(compiled.order_by().len(), 1);
        assert!(compiled.order_by()[0].asc);
        assert!(!compiled.order_by()[0].nulls_first);

        let measures: Vec<(&str, String)> = compiled
            .measures()
            .iter()
            .map(|m| (m.name.as_str(), m.expr.to_string()))
            .collect();
        assert_eq!(
            measures,
            vec![
                ("start_ts", "strt.ts".to_string()),
                ("bottom_ts", "LAST(down.ts)".to_string()),
                ("top", "LAST(up.price)".to_string()),
            ]
        );

        let strt = compiled.definition("strt").unwrap();
        assert!(!strt.explicit);
        assert_eq!(
            compiled.definition("down").unwrap().condition.to_string(),
            "price < PREV(price)"
        );
        assert_eq!(
            compiled.definition("up").unwrap().condition.to_string(),
            "price > PREV(price)"
        );

        assert_eq!(compiled.rows_per_match(), RowsPerMatch::OneRow);
        assert_eq!(
            compiled.after_match_skip(),
            &AfterMatchSkip::ToLast("up".to_string())
        );
        assert_eq!(compiled.schema().variables(), ["strt", "down", "up"]);
        assert_eq!(compiled.schema().len(), 16);
    }

    #[test]
    fn test_nested_pattern_end_to_end() {
        let compiled = compile_body(
            "ORDER BY ts
             PATTERN (((A | B)* C)+)
             DEFINE A AS v < 0, B AS v = 0, C AS v > 0",
        )
        .unwrap();

        let expected = rep(
            Pattern::Concat(vec![
                rep(
                    Pattern::Alternation(vec![named("a"), named("b")]),
                    RepetitionQuantifier::ZeroOrMore,
                ),
                named("c"),
            ]),
            RepetitionQuantifier::OneOrMore,
        );
        assert_eq!(compiled.pattern().without_groups(), expected);
        assert_eq!(compiled.symbols().names(), ["a", "b", "c"]);
        assert!(compiled.definitions().iter().all(|d| d.explicit));
    }

    #[test]
    fn test_defaults() {
        let compiled = compile_body("ORDER BY ts PATTERN (a b) DEFINE b AS v > 0").unwrap();
        assert_eq!(compiled.rows_per_match(), RowsPerMatch::OneRow);
        assert_eq!(compiled.after_match_skip(), &AfterMatchSkip::PastLastRow);
        assert!(compiled.measures().is_empty());
        assert!(compiled.partition_by().is_empty());
        assert_eq!(compiled.definitions().len(), 2);

        let a = compiled.definition("a").unwrap();
        assert!(!a.explicit);
        assert_eq!(a.condition, ScalarPlanner::new().always_true());
        assert!(compiled.definition("b").unwrap().explicit);
    }

    #[test]
    fn test_all_rows_modes() {
        let compiled =
            compile_body("ORDER BY ts ALL ROWS PER MATCH PATTERN (a) DEFINE a AS v > 0").unwrap();
        assert_eq!(
            compiled.rows_per_match(),
            RowsPerMatch::AllRows(EmptyMatchesMode::Show)
        );

        let compiled = compile_body(
            "ORDER BY ts ALL ROWS PER MATCH OMIT EMPTY MATCHES PATTERN (a) DEFINE a AS v > 0",
        )
        .unwrap();
        assert_eq!(
            compiled.rows_per_match().to_string(),
            "ALL ROWS PER MATCH OMIT EMPTY MATCHES"
        );

        let compiled = compile_body(
            "ORDER BY ts ALL ROWS PER MATCH WITH UNMATCHED ROWS PATTERN (a) DEFINE a AS v > 0",
        )
        .unwrap();
        assert_eq!(
            compiled.rows_per_match(),
            RowsPerMatch::AllRows(EmptyMatchesMode::WithUnmatched)
        );
    }

    #[test]
    fn test_order_key_defaults() {
        let compiled =
            compile_body("ORDER BY ts DESC, price NULLS FIRST PATTERN (a) DEFINE a AS v > 0")
                .unwrap();
        let keys: Vec<(bool, bool)> = compiled
            .order_by()
            .iter()
            .map(|k| (k.asc, k.nulls_first))
            .collect();
        assert_eq!(keys, vec![(false, true), (true, true)]);
    }

    #[test]
    fn test_skip_policies() {
        let skip = |head: &str| {
            compile_body(&format!("ORDER BY ts {head} PATTERN (a b) DEFINE a AS v > 0"))
                .map(|c| c.after_match_skip().clone())
        };
        assert_eq!(
            skip("AFTER MATCH SKIP TO NEXT ROW").unwrap(),
            AfterMatchSkip::ToNextRow
        );
        assert_eq!(
            skip("AFTER MATCH SKIP TO FIRST B")
                .unwrap()
                .to_string(),
            "AFTER MATCH SKIP TO FIRST b"
        );
        assert_eq!(
            skip("AFTER MATCH SKIP TO LAST z"),
            Err(CompileError::UnknownSkipTargetSymbol {
                symbol: "z".to_string()
            })
        );
    }

    #[test]
    fn test_undeclared_definition() {
        let err = compile_body("ORDER BY ts PATTERN (a) DEFINE b AS v > 0").unwrap_err();
        assert_eq!(
            err,
            CompileError::UndeclaredDefinition {
                symbol: "b".to_string()
            }
        );
    }

    #[test]
    fn test_case_variants_are_one_symbol() {
        let lower = compile_body("ORDER BY ts PATTERN (a) DEFINE a AS v > 0").unwrap();
        let upper = compile_body("ORDER BY ts PATTERN (A) DEFINE A AS v > 0").unwrap();
        assert_eq!(lower.symbols(), upper.symbols());
        assert_eq!(lower.symbols().len(), 1);
        assert_eq!(lower.pattern(), upper.pattern());
    }

    #[test]
    fn test_permute_end_to_end() {
        let compiled =
            compile_body("ORDER BY ts PATTERN (PERMUTE(a, b, c)) DEFINE a AS v > 0").unwrap();
        assert_eq!(compiled.pattern().to_string(), "PERMUTE(a, b, c)");

        let err =
            compile_body("ORDER BY ts PATTERN (PERMUTE(a, b, a)) DEFINE a AS v > 0").unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicatePermuteSymbol {
                symbol: "a".to_string()
            }
        );
    }

    #[test]
    fn test_anchors_end_to_end() {
        let compiled = compile_body("ORDER BY ts PATTERN (^ a+ $) DEFINE a AS v > 0").unwrap();
        assert_eq!(compiled.pattern().to_string(), "^ a+ $");
        assert_eq!(compiled.symbols().names(), ["a"]);

        let err = compile_body("ORDER BY ts PATTERN (a ^ b) DEFINE a AS v > 0").unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidAnchorPosition {
                anchor: PatternSymbol::Start,
                context: AnchorContext::NotAtBoundary,
            }
        );
    }

    #[test]
    fn test_quantifier_errors_end_to_end() {
        assert_eq!(
            compile_body("ORDER BY ts PATTERN (a{5,2}) DEFINE a AS v > 0").unwrap_err(),
            CompileError::InvalidQuantifierRange { min: 5, max: 2 }
        );
        assert!(matches!(
            compile_body("ORDER BY ts PATTERN (a{0,0}) DEFINE a AS v > 0").unwrap_err(),
            CompileError::EmptyQuantifierRange { .. }
        ));
        assert!(matches!(
            compile_body("ORDER BY ts PATTERN (a{1000000}) DEFINE a AS v > 0").unwrap_err(),
            CompileError::QuantifierOutOfBounds { count: 1_000_000, .. }
        ));
    }

    #[test]
    fn test_options_are_applied() {
        let compiler = MatchRecognizeCompiler::new(ScalarPlanner::new())
            .with_options(CompileOptions::new().with_max_quantifier_bound(3));
        assert_eq!(compiler.options().max_quantifier_bound, 3);
        let err = compiler
            .compile(&clause("ORDER BY ts PATTERN (a{4}) DEFINE a AS v > 0"), &ticks())
            .unwrap_err();
        assert_eq!(
            err,
            CompileError::QuantifierOutOfBounds { count: 4, max: 3 }
        );

        let compiler = MatchRecognizeCompiler::new(ScalarPlanner::new())
            .with_options(CompileOptions::new().with_max_pattern_depth(2));
        assert_eq!(
            compiler
                .compile(&clause("ORDER BY ts PATTERN (((a))) DEFINE a AS v > 0"), &ticks())
                .unwrap_err(),
            CompileError::PatternTooDeep { limit: 2 }
        );
    }

    #[test]
    fn test_reluctant_quantifier_end_to_end() {
        let compiled = compile_body("ORDER BY ts PATTERN (a+? b) DEFINE a AS v > 0").unwrap();
        assert_eq!(compiled.pattern().to_string(), "a+? b");
    }

    #[test]
    fn test_exclusion_end_to_end() {
        // A `{` right after a symbol parses as a quantifier, so the exclusion leads.
        let compiled =
            compile_body("ORDER BY ts ALL ROWS PER MATCH PATTERN ({- b -} c) DEFINE c AS v > 0")
                .unwrap();
        assert_eq!(compiled.pattern().to_string(), "{- b -} c");
        assert_eq!(compiled.symbols().names(), ["b", "c"]);
        assert!(compiled.definition("c").unwrap().explicit);
    }

    #[test]
    fn test_planner_errors_are_tagged() {
        assert_eq!(
            compile_body("ORDER BY ts PATTERN (down) DEFINE down AS prcie < 1")
                .unwrap_err()
                .to_string(),
            "cannot plan DEFINE down: column prcie not found"
        );
        assert_eq!(
            compile_body("PARTITION BY nope ORDER BY ts PATTERN (a) DEFINE a AS v > 0")
                .unwrap_err(),
            CompileError::Plan {
                context: BindingContext::PartitionKey(0),
                source: PlanError::UnknownColumn {
                    qualifier: None,
                    name: "nope".to_string(),
                },
            }
        );
        // Keys cannot see pattern variables.
        assert!(matches!(
            compile_body("ORDER BY a.ts PATTERN (a) DEFINE a AS v > 0").unwrap_err(),
            CompileError::Plan {
                context: BindingContext::OrderKey(0),
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_measure_end_to_end() {
        let err = compile_body(
            "ORDER BY ts MEASURES a.v AS x, a.ts AS X PATTERN (a) DEFINE a AS v > 0",
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateMeasure {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn test_variable_shadowing_table_alias() {
        let err = compile_body("ORDER BY ts PATTERN (ticks) DEFINE ticks AS v > 0").unwrap_err();
        assert_eq!(
            err,
            CompileError::SchemaAugmentationConflict {
                variable: "ticks".to_string(),
                existing: "ticks.symbol".to_string(),
            }
        );
    }

    #[test]
    fn test_subsets() {
        let clause = clause(
            "ORDER BY ts
             MEASURES LAST(updown.price) AS last_move
             AFTER MATCH SKIP TO LAST updown
             PATTERN (strt down+ up+)
             DEFINE up AS price > PREV(price)",
        )
        .with_subset(
            Ident::new("UpDown"),
            vec![Ident::new("up"), Ident::new("DOWN"), Ident::new("up")],
        );
        let compiled = compile(&clause, &ticks()).unwrap();

        assert_eq!(
            compiled.subsets(),
            [SubsetDef {
                name: "updown".to_string(),
                symbols: vec!["up".to_string(), "down".to_string()],
            }]
        );
        assert_eq!(compiled.subsets()[0].to_string(), "updown = (up, down)");
        assert!(compiled.schema().is_variable("updown"));
        assert_eq!(compiled.measures()[0].expr.to_string(), "LAST(updown.price)");
    }

    #[test]
    fn test_subset_errors() {
        let base = clause("ORDER BY ts PATTERN (a b) DEFINE a AS v > 0");

        let err = compile(
            &base.clone().with_subset(Ident::new("u"), vec![Ident::new("z")]),
            &ticks(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownSubsetSymbol {
                subset: "u".to_string(),
                symbol: "z".to_string(),
            }
        );

        let err = compile(
            &base.clone().with_subset(Ident::new("A"), vec![Ident::new("b")]),
            &ticks(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateSubset {
                name: "a".to_string()
            }
        );

        let err = compile(
            &base
                .with_subset(Ident::new("u"), vec![Ident::new("a")])
                .with_subset(Ident::new("U"), vec![Ident::new("b")]),
            &ticks(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateSubset {
                name: "u".to_string()
            }
        );
    }

    #[test]
    fn test_custom_normalizer() {
        let compiler = MatchRecognizeCompiler::new(ScalarPlanner::new())
            .with_normalizer(|ident: &Ident| ident.value.to_uppercase());
        let compiled = compiler
            .compile(&clause("PATTERN (a b) DEFINE a AS TRUE"), &ticks())
            .unwrap();
        assert_eq!(compiled.symbols().names(), ["A", "B"]);
        assert!(compiled.definition("A").unwrap().explicit);
    }

    #[test]
    fn test_normalizer_reaches_column_qualifiers() {
        let compiler = MatchRecognizeCompiler::new(ScalarPlanner::new())
            .with_normalizer(CaseFoldNormalizer::new(false));
        let compiled = compiler
            .compile(
                &clause(
                    "ORDER BY ts
                     MEASURES LAST(B.price) AS top
                     PATTERN (A B+)
                     DEFINE A AS A.price > 0, B AS B.price > PREV(A.price)",
                ),
                &ticks(),
            )
            .unwrap();

        assert_eq!(compiled.symbols().names(), ["A", "B"]);
        assert_eq!(
            compiled.definition("A").unwrap().condition.to_string(),
            "price > 0"
        );
        assert_eq!(
            compiled.definition("B").unwrap().condition.to_string(),
            "price > PREV(A.price)"
        );
        assert_eq!(compiled.measures()[0].expr.to_string(), "LAST(B.price)");

        let err = compiler
            .compile(&clause("ORDER BY ts PATTERN (A) DEFINE A AS a.price > 0"), &ticks())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Plan {
                source: PlanError::UnknownColumn { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_printed_pattern_parses_back() {
        let first = compile_body(r#"ORDER BY ts PATTERN ("Up" b+ | c) DEFINE b AS v > 0"#).unwrap();
        let printed = first.pattern().to_string();
        assert_eq!(printed, r#""Up" b+ | c"#);

        let second =
            compile_body(&format!("ORDER BY ts PATTERN ({printed}) DEFINE b AS v > 0")).unwrap();
        assert_eq!(second.pattern(), first.pattern());
        assert_eq!(second.symbols().names(), ["Up", "b", "c"]);
    }

    #[test]
    fn test_compiler_is_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledMatchRecognize<ScalarExpr>>();
        assert_send_sync::<AugmentedSchema>();
        assert_send_sync::<MatchRecognizeCompiler<ScalarPlanner>>();

        let compiler = MatchRecognizeCompiler::new(ScalarPlanner::new());
        let clause = clause("ORDER BY ts PATTERN (a b+) DEFINE b AS v > PREV(v)");
        let base = ticks();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| compiler.compile(&clause, &base)))
                .collect();
            for handle in handles {
                let compiled = handle.join().unwrap().unwrap();
                assert_eq!(compiled.pattern().to_string(), "a b+");
            }
        });
    }

    #[test]
    fn test_from_table_factor_rejects_plain_table() {
        let mut statements = Parser::parse_sql(&GenericDialect {}, "SELECT * FROM ticks").unwrap();
        let Statement::Query(query) = statements.remove(0) else {
            panic!("expected a query");
        };
        let SetExpr::Select(select) = *query.body else {
            panic!("expected a select");
        };
        assert!(MatchRecognizeClause::from_table_factor(select.from[0].relation.clone()).is_none());
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(RowsPerMatch::OneRow.to_string(), "ONE ROW PER MATCH");
        assert_eq!(
            RowsPerMatch::AllRows(EmptyMatchesMode::Show).to_string(),
            "ALL ROWS PER MATCH SHOW EMPTY MATCHES"
        );
        assert_eq!(
            AfterMatchSkip::PastLastRow.to_string(),
            "AFTER MATCH SKIP PAST LAST ROW"
        );
        assert_eq!(
            AfterMatchSkip::ToLast("a".to_string()).to_string(),
            "AFTER MATCH SKIP TO LAST a"
        );
    }

    #[test]
    fn test_new_clause_compiles_without_keys() {
        let raw = RawPattern::Symbol(sqlparser::ast::MatchRecognizeSymbol::Named(Ident::new("a")));
        let compiled = compile(&MatchRecognizeClause::new(raw), &ticks()).unwrap();
        assert!(compiled.order_by().is_empty());
        assert_eq!(compiled.pattern().to_string(), "a");
    }
}
