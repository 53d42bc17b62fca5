// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Scalar expression planning.
//!
//! The compiler does not own an expression language. It hands every
//! `DEFINE` condition and `MEASURES` expression to an [`ExprPlanner`], which
//! resolves column references against the [`AugmentedSchema`] and returns
//! whatever representation the execution engine evaluates. The only thing
//! the compiler needs from that representation is the ability to rewrite
//! column references ([`ColumnRewrite`]).
//!
//! [`ScalarPlanner`] is a small reference planner producing [`ScalarExpr`]:
//! columns, literals, boolean/comparison/arithmetic operators, `IS [NOT]
//! NULL`, and the row pattern navigation and aggregate functions.
//!
//! # Supported functions
//!
//! ```text
//! PREV(expr [, offset])   NEXT(expr [, offset])    -> type of expr
//! FIRST(expr [, offset])  LAST(expr [, offset])    -> type of expr
//! CLASSIFIER()                                     -> Utf8
//! MATCH_NUMBER()                                   -> UInt64
//! COUNT(*) | COUNT(expr)                           -> Int64
//! SUM(numeric)  AVG(numeric)  ABS(numeric)
//! MIN(expr)  MAX(expr)
//! ```

use std::fmt;

use arrow_schema::DataType;
use sqlparser::ast::{
    self, BinaryOperator, FunctionArg, FunctionArgExpr, FunctionArguments, UnaryOperator, Value,
};
use tracing::trace;

use crate::common::ident::IdentNormalizer;
use crate::schema::AugmentedSchema;

fn qualified(qualifier: Option<&str>, name: &str) -> String {
    match qualifier {
        Some(q) => format!("{q}.{name}"),
        None => name.to_string(),
    }
}

/// Error raised by an [`ExprPlanner`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PlanError {
    /// No field matches the reference.
    #[error("column {} not found", qualified(.qualifier.as_deref(), .name))]
    UnknownColumn {
        /// Qualifier as written, normalized.
        qualifier: Option<String>,
        /// Column name, normalized.
        name: String,
    },

    /// More than one field matches the reference.
    #[error("column reference {name} is ambiguous")]
    AmbiguousColumn {
        /// The reference as written.
        name: String,
    },

    /// An operand has the wrong type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Description of the accepted type(s).
        expected: String,
        /// The operand's actual type.
        found: DataType,
    },

    /// Syntax the planner does not handle.
    #[error("unsupported expression: {0}")]
    Unsupported(String),
}

/// A column reference inside a planned expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Pattern variable, subset, or relation qualifier; `None` for the current row.
    pub qualifier: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// A reference to `name` in the current row.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    /// A reference to `name` through `qualifier`.
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&qualified(self.qualifier.as_deref(), &self.name))
    }
}

/// Expressions whose column references can be rewritten in place.
pub trait ColumnRewrite: Sized {
    /// Applies `f` to every column reference, returning the rewritten expression.
    #[must_use]
    fn map_columns<F>(self, f: &mut F) -> Self
    where
        F: FnMut(ColumnRef) -> ColumnRef;
}

/// Plans SQL expressions against an augmented schema.
///
/// The compiler passes its own [`IdentNormalizer`] to every call. Column
/// qualifiers must be normalized with it so that `A.price` resolves against
/// the variable copy the symbol table produced for `A`.
pub trait ExprPlanner {
    /// The planned expression type.
    type Expr: ColumnRewrite;

    /// Plans a value expression (`MEASURES`, `PARTITION BY`, `ORDER BY`).
    fn plan(
        &self,
        expr: &ast::Expr,
        schema: &AugmentedSchema,
        normalizer: &dyn IdentNormalizer,
    ) -> Result<Self::Expr, PlanError>;

    /// Plans a boolean condition (`DEFINE`).
    ///
    /// Defaults to [`plan`](Self::plan); planners that track types should
    /// reject non-boolean conditions here.
    fn plan_predicate(
        &self,
        expr: &ast::Expr,
        schema: &AugmentedSchema,
        normalizer: &dyn IdentNormalizer,
    ) -> Result<Self::Expr, PlanError> {
        self.plan(expr, schema, normalizer)
    }

    /// The condition given to pattern variables without a `DEFINE` entry.
    fn always_true(&self) -> Self::Expr;
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// SQL `NULL`.
    Null,
    /// `TRUE` / `FALSE`.
    Boolean(bool),
    /// Integer literal.
    Int64(i64),
    /// Literal with a fractional part or exponent.
    Float64(f64),
    /// Single-quoted string.
    Utf8(String),
}

impl ScalarValue {
    /// The arrow type of the literal.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Int64(n) => write!(f, "{n}"),
            Self::Float64(n) => write!(f, "{n:?}"),
            Self::Utf8(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// Binary operators understood by [`ScalarPlanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Logical `AND`.
    And,
    /// Logical `OR`.
    Or,
    /// `=`
    Eq,
    /// `<>` / `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
}

impl BinaryOp {
    const fn from_sql(op: &BinaryOperator) -> Option<Self> {
        Some(match op {
            BinaryOperator::And => Self::And,
            BinaryOperator::Or => Self::Or,
            BinaryOperator::Eq => Self::Eq,
            BinaryOperator::NotEq => Self::NotEq,
            BinaryOperator::Lt => Self::Lt,
            BinaryOperator::LtEq => Self::LtEq,
            BinaryOperator::Gt => Self::Gt,
            BinaryOperator::GtEq => Self::GtEq,
            BinaryOperator::Plus => Self::Plus,
            BinaryOperator::Minus => Self::Minus,
            BinaryOperator::Multiply => Self::Multiply,
            BinaryOperator::Divide => Self::Divide,
            BinaryOperator::Modulo => Self::Modulo,
            _ => return None,
        })
    }

    const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        })
    }
}

/// Functions understood by [`ScalarPlanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Value at an earlier row.
    Prev,
    /// Value at a later row.
    Next,
    /// Value at the first row mapped to a variable.
    First,
    /// Value at the last row mapped to a variable.
    Last,
    /// Name of the variable the row was mapped to.
    Classifier,
    /// Sequential number of the match within its partition.
    MatchNumber,
    /// Row count.
    Count,
    /// Sum.
    Sum,
    /// Average.
    Avg,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Absolute value.
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "PREV" => Self::Prev,
            "NEXT" => Self::Next,
            "FIRST" => Self::First,
            "LAST" => Self::Last,
            "CLASSIFIER" => Self::Classifier,
            "MATCH_NUMBER" => Self::MatchNumber,
            "COUNT" => Self::Count,
            "SUM" => Self::Sum,
            "AVG" => Self::Avg,
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            "ABS" => Self::Abs,
            _ => return None,
        })
    }

    /// Returns true for the row pattern navigation functions.
    #[must_use]
    pub const fn is_navigation(self) -> bool {
        matches!(self, Self::Prev | Self::Next | Self::First | Self::Last)
    }

    /// Accepted argument counts, inclusive.
    const fn arity(self) -> (usize, usize) {
        match self {
            Self::Prev | Self::Next | Self::First | Self::Last => (1, 2),
            Self::Classifier | Self::MatchNumber => (0, 0),
            Self::Count => (0, 1),
            Self::Sum | Self::Avg | Self::Min | Self::Max | Self::Abs => (1, 1),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prev => "PREV",
            Self::Next => "NEXT",
            Self::First => "FIRST",
            Self::Last => "LAST",
            Self::Classifier => "CLASSIFIER",
            Self::MatchNumber => "MATCH_NUMBER",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Abs => "ABS",
        })
    }
}

/// Expression produced by [`ScalarPlanner`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    /// A column reference.
    Column(ColumnRef),
    /// A literal.
    Literal(ScalarValue),
    /// `left op right`.
    Binary {
        /// Left operand.
        left: Box<ScalarExpr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<ScalarExpr>,
    },
    /// `NOT expr`.
    Not(Box<ScalarExpr>),
    /// `-expr`.
    Negative(Box<ScalarExpr>),
    /// `expr IS NULL`.
    IsNull(Box<ScalarExpr>),
    /// `expr IS NOT NULL`.
    IsNotNull(Box<ScalarExpr>),
    /// A function call. `COUNT(*)` is a `Count` call with no arguments.
    Call {
        /// The function.
        function: Function,
        /// Arguments in call order.
        args: Vec<ScalarExpr>,
    },
}

impl ScalarExpr {
    /// Shorthand for a column reference.
    #[must_use]
    pub const fn column(column: ColumnRef) -> Self {
        Self::Column(column)
    }

    /// Every column reference, left to right.
    #[must_use]
    pub fn column_refs(&self) -> Vec<&ColumnRef> {
        let mut refs = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Self::Column(column) => refs.push(column),
                Self::Literal(_) => {}
                Self::Binary { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
                Self::Not(inner)
                | Self::Negative(inner)
                | Self::IsNull(inner)
                | Self::IsNotNull(inner) => stack.push(inner),
                Self::Call { args, .. } => stack.extend(args.iter().rev()),
            }
        }
        refs
    }
}

impl ColumnRewrite for ScalarExpr {
    fn map_columns<F>(self, f: &mut F) -> Self
    where
        F: FnMut(ColumnRef) -> ColumnRef,
    {
        match self {
            Self::Column(column) => Self::Column(f(column)),
            Self::Literal(_) => self,
            Self::Binary { left, op, right } => Self::Binary {
                left: Box::new(left.map_columns(f)),
                op,
                right: Box::new(right.map_columns(f)),
            },
            Self::Not(inner) => Self::Not(Box::new(inner.map_columns(f))),
            Self::Negative(inner) => Self::Negative(Box::new(inner.map_columns(f))),
            Self::IsNull(inner) => Self::IsNull(Box::new(inner.map_columns(f))),
            Self::IsNotNull(inner) => Self::IsNotNull(Box::new(inner.map_columns(f))),
            Self::Call { function, args } => Self::Call {
                function,
                args: args.into_iter().map(|arg| arg.map_columns(f)).collect(),
            },
        }
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "{column}"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Binary { left, op, right } => {
                write_operand(f, left)?;
                write!(f, " {op} ")?;
                write_operand(f, right)
            }
            Self::Not(inner) => {
                f.write_str("NOT ")?;
                write_operand(f, inner)
            }
            Self::Negative(inner) => {
                f.write_str("-")?;
                write_operand(f, inner)
            }
            Self::IsNull(inner) => {
                write_operand(f, inner)?;
                f.write_str(" IS NULL")
            }
            Self::IsNotNull(inner) => {
                write_operand(f, inner)?;
                f.write_str(" IS NOT NULL")
            }
            Self::Call { function, args } => {
                write!(f, "{function}(")?;
                if args.is_empty() && *function == Function::Count {
                    f.write_str("*")?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &ScalarExpr) -> fmt::Result {
    match expr {
        ScalarExpr::Binary { .. }
        | ScalarExpr::Not(_)
        | ScalarExpr::IsNull(_)
        | ScalarExpr::IsNotNull(_) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

/// Reference [`ExprPlanner`] producing type-checked [`ScalarExpr`] trees.
///
/// Column identifiers are normalized with the normalizer handed in by the
/// caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarPlanner;

impl ScalarPlanner {
    /// Creates the planner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn plan_typed(
        self,
        expr: &ast::Expr,
        schema: &AugmentedSchema,
        normalizer: &dyn IdentNormalizer,
    ) -> Result<(ScalarExpr, DataType), PlanError> {
        let plan = |expr: &ast::Expr| self.plan_typed(expr, schema, normalizer);
        match expr {
            ast::Expr::Identifier(ident) => {
                let name = normalizer.normalize(ident);
                let field = schema.resolve(None, &name)?;
                Ok((
                    ScalarExpr::Column(ColumnRef::bare(name)),
                    field.data_type().clone(),
                ))
            }
            ast::Expr::CompoundIdentifier(parts) => match parts.as_slice() {
                [qualifier, name] => {
                    let qualifier = normalizer.normalize(qualifier);
                    let name = normalizer.normalize(name);
                    let field = schema.resolve(Some(&qualifier), &name)?;
                    Ok((
                        ScalarExpr::Column(ColumnRef::qualified(qualifier, name)),
                        field.data_type().clone(),
                    ))
                }
                _ => Err(PlanError::Unsupported(format!(
                    "compound identifier {expr}"
                ))),
            },
            ast::Expr::Value(value) => {
                let literal = literal(&value.value)?;
                let data_type = literal.data_type();
                Ok((ScalarExpr::Literal(literal), data_type))
            }
            ast::Expr::Nested(inner) => plan(inner),
            ast::Expr::IsNull(inner) => {
                let (inner, _) = plan(inner)?;
                Ok((ScalarExpr::IsNull(Box::new(inner)), DataType::Boolean))
            }
            ast::Expr::IsNotNull(inner) => {
                let (inner, _) = plan(inner)?;
                Ok((ScalarExpr::IsNotNull(Box::new(inner)), DataType::Boolean))
            }
            ast::Expr::UnaryOp { op, expr: inner } => {
                let (planned, data_type) = plan(inner)?;
                match op {
                    UnaryOperator::Not => {
                        expect_boolean(&data_type)?;
                        Ok((ScalarExpr::Not(Box::new(planned)), DataType::Boolean))
                    }
                    UnaryOperator::Minus => {
                        expect_numeric(&data_type)?;
                        Ok((ScalarExpr::Negative(Box::new(planned)), data_type))
                    }
                    UnaryOperator::Plus => {
                        expect_numeric(&data_type)?;
                        Ok((planned, data_type))
                    }
                    other => Err(PlanError::Unsupported(format!("unary operator {other}"))),
                }
            }
            ast::Expr::BinaryOp { left, op, right } => {
                let op = BinaryOp::from_sql(op)
                    .ok_or_else(|| PlanError::Unsupported(format!("binary operator {op}")))?;
                let (left, left_type) = plan(left)?;
                let (right, right_type) = plan(right)?;
                let data_type = binary_type(op, &left_type, &right_type)?;
                Ok((
                    ScalarExpr::Binary {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    },
                    data_type,
                ))
            }
            ast::Expr::Function(function) => self.plan_call(function, schema, normalizer),
            other => Err(PlanError::Unsupported(other.to_string())),
        }
    }

    fn plan_call(
        self,
        call: &ast::Function,
        schema: &AugmentedSchema,
        normalizer: &dyn IdentNormalizer,
    ) -> Result<(ScalarExpr, DataType), PlanError> {
        let name = call.name.to_string();
        let function = Function::from_name(&name)
            .ok_or_else(|| PlanError::Unsupported(format!("function {name}")))?;

        // Modifiers change what the call computes and have no ScalarExpr form.
        let has_modifier = !matches!(call.parameters, FunctionArguments::None)
            || call.filter.is_some()
            || call.null_treatment.is_some()
            || call.over.is_some()
            || !call.within_group.is_empty();
        if has_modifier {
            return Err(PlanError::Unsupported(format!("call modifiers in {call}")));
        }

        let raw_args: &[FunctionArg] = match &call.args {
            FunctionArguments::None => &[],
            FunctionArguments::List(list) => {
                if list.duplicate_treatment.is_some() || !list.clauses.is_empty() {
                    return Err(PlanError::Unsupported(format!(
                        "argument modifiers in {call}"
                    )));
                }
                &list.args
            }
            FunctionArguments::Subquery(_) => {
                return Err(PlanError::Unsupported(format!(
                    "subquery argument to {function}"
                )));
            }
        };

        let mut args = Vec::with_capacity(raw_args.len());
        let mut types = Vec::with_capacity(raw_args.len());
        for arg in raw_args {
            match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => {
                    let (planned, data_type) = self.plan_typed(expr, schema, normalizer)?;
                    args.push(planned);
                    types.push(data_type);
                }
                FunctionArg::Unnamed(FunctionArgExpr::Wildcard)
                    if function == Function::Count && raw_args.len() == 1 => {}
                other => {
                    return Err(PlanError::Unsupported(format!(
                        "argument {other} to {function}"
                    )))
                }
            }
        }

        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            return Err(PlanError::Unsupported(format!(
                "{function} with {} arguments",
                args.len()
            )));
        }

        let data_type = match function {
            Function::Prev | Function::Next | Function::First | Function::Last => {
                if let Some(offset) = types.get(1) {
                    if !offset.is_integer() {
                        return Err(PlanError::TypeMismatch {
                            expected: "integer offset".to_string(),
                            found: offset.clone(),
                        });
                    }
                }
                types[0].clone()
            }
            Function::Classifier => DataType::Utf8,
            Function::MatchNumber => DataType::UInt64,
            Function::Count => DataType::Int64,
            Function::Sum => {
                expect_numeric(&types[0])?;
                if types[0].is_floating() {
                    DataType::Float64
                } else {
                    DataType::Int64
                }
            }
            Function::Avg => {
                expect_numeric(&types[0])?;
                DataType::Float64
            }
            Function::Abs => {
                expect_numeric(&types[0])?;
                types[0].clone()
            }
            Function::Min | Function::Max => types[0].clone(),
        };

        trace!(%function, args = args.len(), "planned function call");
        Ok((ScalarExpr::Call { function, args }, data_type))
    }
}

impl ExprPlanner for ScalarPlanner {
    type Expr = ScalarExpr;

    fn plan(
        &self,
        expr: &ast::Expr,
        schema: &AugmentedSchema,
        normalizer: &dyn IdentNormalizer,
    ) -> Result<ScalarExpr, PlanError> {
        self.plan_typed(expr, schema, normalizer).map(|(expr, _)| expr)
    }

    fn plan_predicate(
        &self,
        expr: &ast::Expr,
        schema: &AugmentedSchema,
        normalizer: &dyn IdentNormalizer,
    ) -> Result<ScalarExpr, PlanError> {
        let (planned, data_type) = self.plan_typed(expr, schema, normalizer)?;
        expect_boolean(&data_type)?;
        Ok(planned)
    }

    fn always_true(&self) -> ScalarExpr {
        ScalarExpr::Literal(ScalarValue::Boolean(true))
    }
}

fn literal(value: &Value) -> Result<ScalarValue, PlanError> {
    match value {
        Value::Null => Ok(ScalarValue::Null),
        Value::Boolean(b) => Ok(ScalarValue::Boolean(*b)),
        Value::SingleQuotedString(s) => Ok(ScalarValue::Utf8(s.clone())),
        Value::Number(n, _) => n
            .parse::<i64>()
            .map(ScalarValue::Int64)
            .or_else(|_| n.parse::<f64>().map(ScalarValue::Float64))
            .map_err(|_| PlanError::Unsupported(format!("numeric literal {n}"))),
        other => Err(PlanError::Unsupported(format!("literal {other}"))),
    }
}

fn expect_boolean(data_type: &DataType) -> Result<(), PlanError> {
    match data_type {
        DataType::Boolean | DataType::Null => Ok(()),
        other => Err(PlanError::TypeMismatch {
            expected: "Boolean".to_string(),
            found: other.clone(),
        }),
    }
}

fn expect_numeric(data_type: &DataType) -> Result<(), PlanError> {
    if data_type.is_numeric() || *data_type == DataType::Null {
        Ok(())
    } else {
        Err(PlanError::TypeMismatch {
            expected: "numeric".to_string(),
            found: data_type.clone(),
        })
    }
}

fn binary_type(op: BinaryOp, left: &DataType, right: &DataType) -> Result<DataType, PlanError> {
    if op.is_logical() {
        expect_boolean(left)?;
        expect_boolean(right)?;
        return Ok(DataType::Boolean);
    }

    if op.is_comparison() {
        let comparable = left == right
            || *left == DataType::Null
            || *right == DataType::Null
            || (left.is_numeric() && right.is_numeric());
        return if comparable {
            Ok(DataType::Boolean)
        } else {
            Err(PlanError::TypeMismatch {
                expected: left.to_string(),
                found: right.clone(),
            })
        };
    }

    expect_numeric(left)?;
    expect_numeric(right)?;
    Ok(match (left, right) {
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (l, r) if l == r => l.clone(),
        (l, r) if l.is_floating() || r.is_floating() => DataType::Float64,
        _ => DataType::Int64,
    })
}
