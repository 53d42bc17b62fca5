// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/rowpattern)

//! Row schemas and pattern-variable schema augmentation.
//!
//! `MEASURES` and `DEFINE` expressions refer to columns through pattern
//! variables (`A.price`, `LAST(UP.price)`). To let an ordinary scalar planner
//! resolve those references, the base row schema is augmented: for every
//! pattern variable `v` and base column `c`, a field `v.c` is added with
//! `c`'s type. The copy is always nullable, because a variable may match zero
//! rows under quantifiers like `*` or `?`.
//!
//! # Layout
//!
//! ```text
//! base: t.id, t.price
//! vars: strt, down
//!
//! augmented: strt.id, strt.price, down.id, down.price, t.id, t.price
//! ```
//!
//! Variable copies come first, in symbol-table order, followed by the base
//! fields with their original qualifiers. Unqualified references resolve
//! against the base fields only: an unqualified column always means the row
//! currently being evaluated.

use std::fmt;
use std::sync::Arc;

use arrow_schema::{DataType, FieldRef, Schema};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{CompileError, Result};
use crate::planner::PlanError;
use crate::symbols::SymbolTable;

/// A field plus the optional relation qualifier it is reachable through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedField {
    qualifier: Option<String>,
    field: FieldRef,
}

impl QualifiedField {
    /// Creates a qualified field.
    #[must_use]
    pub fn new(qualifier: Option<String>, field: FieldRef) -> Self {
        Self { qualifier, field }
    }

    /// The qualifier (table alias or pattern variable), if any.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The underlying arrow field.
    #[must_use]
    pub const fn field(&self) -> &FieldRef {
        &self.field
    }

    /// The unqualified column name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// The column type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        self.field.data_type()
    }

    /// Whether the column may be null.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.field.is_nullable()
    }
}

impl fmt::Display for QualifiedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// The input row schema of a `MATCH_RECOGNIZE` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSchema {
    fields: Vec<QualifiedField>,
}

impl RowSchema {
    /// Wraps an arrow schema, qualifying every field with `qualifier`.
    #[must_use]
    pub fn new(qualifier: Option<&str>, schema: &Schema) -> Self {
        Self::from_fields(
            schema
                .fields()
                .iter()
                .map(|field| (qualifier.map(str::to_string), Arc::clone(field))),
        )
    }

    /// Builds a schema from `(qualifier, field)` pairs, e.g. the output of a join.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (Option<String>, FieldRef)>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(qualifier, field)| QualifiedField::new(qualifier, field))
                .collect(),
        }
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[QualifiedField] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Qualified-name lookup slot; `None` marks a name reachable twice.
type Slot = Option<usize>;

/// A row schema extended with one nullable column set per pattern variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentedSchema {
    fields: Vec<QualifiedField>,
    /// Index of the first base field; everything before it is a variable copy.
    base_start: usize,
    /// Pattern variable and subset names exposed as qualifiers.
    variables: Vec<String>,
    qualified: FxHashMap<(String, String), Slot>,
}

impl AugmentedSchema {
    /// A schema with the base fields only and no pattern variables.
    ///
    /// Used for `PARTITION BY` and `ORDER BY`, which cannot see variables.
    #[must_use]
    pub fn from_base(base: &RowSchema) -> Self {
        let mut schema = Self {
            fields: Vec::with_capacity(base.len()),
            base_start: 0,
            variables: Vec::new(),
            qualified: FxHashMap::default(),
        };
        schema.push_base(base);
        schema
    }

    fn push_variable(&mut self, variable: &str, base: &RowSchema) {
        for base_field in base.fields() {
            let field = Arc::new(base_field.field().as_ref().clone().with_nullable(true));
            self.push(QualifiedField::new(Some(variable.to_string()), field));
        }
        self.variables.push(variable.to_string());
        self.base_start = self.fields.len();
    }

    fn push_base(&mut self, base: &RowSchema) {
        for field in base.fields() {
            self.push(field.clone());
        }
    }

    fn push(&mut self, field: QualifiedField) {
        let idx = self.fields.len();
        if let Some(qualifier) = field.qualifier() {
            self.qualified
                .entry((qualifier.to_string(), field.name().to_string()))
                .and_modify(|slot| *slot = None)
                .or_insert(Some(idx));
        }
        self.fields.push(field);
    }

    /// All fields: variable copies first, then the base fields.
    #[must_use]
    pub fn fields(&self) -> &[QualifiedField] {
        &self.fields
    }

    /// The base fields, i.e. what an unqualified reference can see.
    #[must_use]
    pub fn base_fields(&self) -> &[QualifiedField] {
        &self.fields[self.base_start..]
    }

    /// The copies exposed under `variable`, in base column order.
    pub fn variable_fields<'a>(
        &'a self,
        variable: &'a str,
    ) -> impl Iterator<Item = &'a QualifiedField> + 'a {
        self.fields[..self.base_start]
            .iter()
            .filter(move |field| field.qualifier() == Some(variable))
    }

    /// Pattern variables and subsets exposed as qualifiers, in order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns true if `qualifier` names a pattern variable or subset.
    #[must_use]
    pub fn is_variable(&self, qualifier: &str) -> bool {
        self.variables.iter().any(|v| v == qualifier)
    }

    /// Total number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves a column reference.
    ///
    /// A qualified reference must match exactly one field with that
    /// qualifier. An unqualified reference must match exactly one base field.
    pub fn resolve(
        &self,
        qualifier: Option<&str>,
        name: &str,
    ) -> Result<&QualifiedField, PlanError> {
        let unknown = || PlanError::UnknownColumn {
            qualifier: qualifier.map(str::to_string),
            name: name.to_string(),
        };

        match qualifier {
            Some(q) => match self.qualified.get(&(q.to_string(), name.to_string())) {
                Some(Some(idx)) => Ok(&self.fields[*idx]),
                Some(None) => Err(PlanError::AmbiguousColumn {
                    name: format!("{q}.{name}"),
                }),
                None => Err(unknown()),
            },
            None => {
                let mut matches = self.base_fields().iter().filter(|f| f.name() == name);
                match (matches.next(), matches.next()) {
                    (Some(field), None) => Ok(field),
                    (Some(_), Some(_)) => Err(PlanError::AmbiguousColumn {
                        name: name.to_string(),
                    }),
                    (None, _) => Err(unknown()),
                }
            }
        }
    }
}

/// Augments `base` with a column set for every pattern variable and subset.
///
/// # Errors
///
/// `SchemaAugmentationConflict` when a variable name equals a qualifier the
/// base schema already uses, or names a struct column (so `v.x` could also
/// be a field access).
pub fn augment_schema<'a, I>(
    base: &RowSchema,
    symbols: &SymbolTable,
    subsets: I,
) -> Result<AugmentedSchema>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut schema = AugmentedSchema {
        fields: Vec::with_capacity(base.len() * (symbols.len() + 1)),
        base_start: 0,
        variables: Vec::with_capacity(symbols.len()),
        qualified: FxHashMap::default(),
    };

    for variable in symbols {
        check_conflict(variable, base)?;
        schema.push_variable(variable, base);
    }
    for subset in subsets {
        check_conflict(subset, base)?;
        schema.push_variable(subset, base);
    }
    schema.push_base(base);

    debug!(
        base_fields = base.len(),
        variables = schema.variables.len(),
        fields = schema.len(),
        "augmented row schema"
    );
    Ok(schema)
}

fn check_conflict(variable: &str, base: &RowSchema) -> Result<()> {
    for field in base.fields() {
        if field.qualifier() == Some(variable)
            || (field.name() == variable && matches!(field.data_type(), DataType::Struct(_)))
        {
            return Err(CompileError::SchemaAugmentationConflict {
                variable: variable.to_string(),
                existing: field.to_string(),
            });
        }
    }
    Ok(())
}
