// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Binding of `DEFINE` conditions and `MEASURES` expressions.
//!
//! Both clauses are planned against the augmented schema, so `A.price`
//! resolves like any qualified column. After planning, a `DEFINE` condition
//! has its owner's qualifier removed: inside `DEFINE A AS A.price > 10`, the
//! row under test is the row being classified as `A`, so `A.price` and
//! `price` mean the same thing. References through any other variable stay
//! qualified and are resolved by the runtime against the match so far.
//!
//! ```text
//! DEFINE down AS down.price < PREV(up.price)
//!   bound:  price < PREV(up.price)
//! ```
//!
//! Measures keep every qualifier, because they are evaluated over a finished
//! match rather than a single row.

use rustc_hash::{FxHashMap, FxHashSet};
use sqlparser::ast::{Expr, Measure, SymbolDefinition as RawDefinition};
use tracing::{debug, trace};

use crate::common::ident::IdentNormalizer;
use crate::error::{BindingContext, CompileError, Result};
use crate::planner::{ColumnRef, ColumnRewrite, ExprPlanner};
use crate::schema::AugmentedSchema;
use crate::symbols::SymbolTable;

/// A pattern variable and the condition a row must satisfy to map to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDefinition<E> {
    /// Normalized variable name.
    pub symbol: String,
    /// Bound condition with the variable's own qualifier stripped.
    pub condition: E,
    /// False when the variable had no `DEFINE` entry and the condition is
    /// the planner's always-true expression.
    pub explicit: bool,
}

/// A bound `MEASURES` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundMeasure<E> {
    /// Normalized output column name.
    pub name: String,
    /// Bound expression over the augmented schema.
    pub expr: E,
}

/// Removes `symbol` from every column reference qualified by it.
pub fn strip_qualifier<E: ColumnRewrite>(expr: E, symbol: &str) -> E {
    expr.map_columns(&mut |column: ColumnRef| {
        if column.qualifier.as_deref() == Some(symbol) {
            ColumnRef::bare(column.name)
        } else {
            column
        }
    })
}

/// Binds one condition per symbol-table entry, in table order.
///
/// Variables without a `DEFINE` entry get [`ExprPlanner::always_true`].
/// The definitions are expected to have passed symbol-table validation, so
/// every name is a known variable and appears at most once.
pub fn bind_definitions<P, N>(
    planner: &P,
    definitions: &[RawDefinition],
    symbols: &SymbolTable,
    schema: &AugmentedSchema,
    normalizer: &N,
) -> Result<Vec<SymbolDefinition<P::Expr>>>
where
    P: ExprPlanner + ?Sized,
    N: IdentNormalizer,
{
    let by_name: FxHashMap<String, &Expr> = definitions
        .iter()
        .map(|definition| (normalizer.normalize(&definition.symbol), &definition.definition))
        .collect();

    let mut bound = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let definition = match by_name.get(symbol) {
            Some(expr) => {
                let condition = planner
                    .plan_predicate(expr, schema, normalizer)
                    .map_err(|source| {
                        CompileError::plan(BindingContext::Define(symbol.to_string()), source)
                    })?;
                SymbolDefinition {
                    symbol: symbol.to_string(),
                    condition: strip_qualifier(condition, symbol),
                    explicit: true,
                }
            }
            None => SymbolDefinition {
                symbol: symbol.to_string(),
                condition: planner.always_true(),
                explicit: false,
            },
        };
        trace!(symbol, explicit = definition.explicit, "bound pattern variable definition");
        bound.push(definition);
    }

    debug!(
        definitions = bound.len(),
        explicit = definitions.len(),
        "bound DEFINE clause"
    );
    Ok(bound)
}

/// Binds `MEASURES` entries in declaration order.
///
/// # Errors
///
/// `DuplicateMeasure` if two output names normalize to the same name, or
/// `Plan` tagged with the measure name if the planner fails.
pub fn bind_measures<P, N>(
    planner: &P,
    measures: &[Measure],
    schema: &AugmentedSchema,
    normalizer: &N,
) -> Result<Vec<BoundMeasure<P::Expr>>>
where
    P: ExprPlanner + ?Sized,
    N: IdentNormalizer,
{
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut bound = Vec::with_capacity(measures.len());

    for measure in measures {
        let name = normalizer.normalize(&measure.alias);
        if !seen.insert(name.clone()) {
            return Err(CompileError::DuplicateMeasure { name });
        }
        let expr = planner
            .plan(&measure.expr, schema, normalizer)
            .map_err(|source| CompileError::plan(BindingContext::Measure(name.clone()), source))?;
        trace!(measure = %name, "bound measure");
        bound.push(BoundMeasure { name, expr });
    }

    debug!(measures = bound.len(), "bound MEASURES clause");
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ident::CaseFoldNormalizer;
    use crate::planner::{PlanError, ScalarExpr, ScalarPlanner};
    use crate::schema::{augment_schema, RowSchema};
    use arrow_schema::{DataType, Field, Schema};
    use pretty_assertions::assert_eq;
    use sqlparser::ast::Ident;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn parse(sql: &str) -> Expr {
        Parser::new(&GenericDialect {})
            .try_with_sql(sql)
            .unwrap()
            .parse_expr()
            .unwrap()
    }

    fn symbols(names: &[&str]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for name in names {
            table.insert((*name).to_string());
        }
        table
    }

    fn schema(table: &SymbolTable) -> AugmentedSchema {
        let base = RowSchema::new(
            None,
            &Schema::new(vec![
                Field::new("price", DataType::Float64, false),
                Field::new("qty", DataType::Int64, false),
            ]),
        );
        augment_schema(&base, table, []).unwrap()
    }

    fn define(name: &str, sql: &str) -> RawDefinition {
        RawDefinition {
            symbol: Ident::new(name),
            definition: parse(sql),
        }
    }

    fn measure(sql: &str, alias: &str) -> Measure {
        Measure {
            expr: parse(sql),
            alias: Ident::new(alias),
        }
    }

    #[test]
    fn test_strip_owner_qualifier_only() {
        let table = symbols(&["up", "down"]);
        let planner = ScalarPlanner::new();
        let expr = planner
            .plan(
                &parse("down.price < PREV(up.price) AND down.qty > 0"),
                &schema(&table),
                &CaseFoldNormalizer::default(),
            )
            .unwrap();
        let stripped = strip_qualifier(expr, "down");
        assert_eq!(
            stripped.to_string(),
            "(price < PREV(up.price)) AND (qty > 0)"
        );
    }

    #[test]
    fn test_definitions_follow_symbol_order() {
        let table = symbols(&["strt", "down", "up"]);
        let defs = [
            define("UP", "up.price > PREV(up.price)"),
            define("DOWN", "price < PREV(price)"),
        ];
        let bound = bind_definitions(
            &ScalarPlanner::new(),
            &defs,
            &table,
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap();

        let summary: Vec<(&str, String, bool)> = bound
            .iter()
            .map(|d| (d.symbol.as_str(), d.condition.to_string(), d.explicit))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("strt", "TRUE".to_string(), false),
                ("down", "price < PREV(price)".to_string(), true),
                ("up", "price > PREV(price)".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_undefined_symbol_gets_always_true() {
        let table = symbols(&["a"]);
        let bound = bind_definitions(
            &ScalarPlanner::new(),
            &[],
            &table,
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].condition, ScalarPlanner::new().always_true());
        assert!(!bound[0].explicit);
    }

    #[test]
    fn test_definition_error_names_symbol() {
        let table = symbols(&["down"]);
        let err = bind_definitions(
            &ScalarPlanner::new(),
            &[define("down", "prcie < 1")],
            &table,
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::Plan {
                context: BindingContext::Define("down".to_string()),
                source: PlanError::UnknownColumn {
                    qualifier: None,
                    name: "prcie".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_non_boolean_definition_rejected() {
        let table = symbols(&["a"]);
        let err = bind_definitions(
            &ScalarPlanner::new(),
            &[define("a", "price + 1")],
            &table,
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::Plan {
                source: PlanError::TypeMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_measures_keep_qualifiers() {
        let table = symbols(&["strt", "up"]);
        let bound = bind_measures(
            &ScalarPlanner::new(),
            &[
                measure("STRT.price", "Start_Price"),
                measure("LAST(UP.price)", "top_price"),
            ],
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap();
        assert_eq!(bound[0].name, "start_price");
        assert_eq!(bound[0].expr.to_string(), "strt.price");
        assert_eq!(bound[1].name, "top_price");
        assert!(matches!(bound[1].expr, ScalarExpr::Call { .. }));
        assert_eq!(bound[1].expr.to_string(), "LAST(up.price)");
    }

    #[test]
    fn test_duplicate_measure_rejected() {
        let table = symbols(&["a"]);
        let err = bind_measures(
            &ScalarPlanner::new(),
            &[measure("a.price", "p"), measure("a.qty", "P")],
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateMeasure {
                name: "p".to_string()
            }
        );
    }

    #[test]
    fn test_measure_error_names_measure() {
        let table = symbols(&["a"]);
        let err = bind_measures(
            &ScalarPlanner::new(),
            &[measure("b.price", "p")],
            &schema(&table),
            &CaseFoldNormalizer::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot plan measure p: column b.price not found"
        );
    }
}
