//! Composition of a `Select<E>` from extracted parameters.
//!
//! Predicates are applied in a fixed order: equality/membership filters, interval bounds,
//! the disjunctive search condition, then ordering. Each predicate is added with its own
//! `.filter()` call, so the same parameters always produce the same SQL.

use sea_orm::{
    Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select, sea_query::Order,
};
use serde_json::Value as JsonValue;

use super::params::ExtractedParams;
use super::predicate::{Filter, FilterTree, Operator, compile_filter, compile_tree};
use super::search::ilike;
use super::sort::{Direction, SortSpec};
use crate::columns::{ColumnMap, display_json};
use crate::errors::CrudError;

/// Inclusive lower and exclusive upper bound on one column.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalSpec {
    pub column: String,
    pub start: Option<JsonValue>,
    pub end: Option<JsonValue>,
}

/// Case-insensitive substring search on one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSpec {
    pub column: String,
    pub substring: String,
}

impl SearchSpec {
    pub fn new(column: impl Into<String>, substring: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            substring: substring.into(),
        }
    }
}

pub struct StatementBuilder<'a, E: EntityTrait> {
    columns: &'a ColumnMap<E>,
    select: Select<E>,
}

impl<'a, E: EntityTrait> StatementBuilder<'a, E> {
    /// Start from `SELECT * FROM <entity>`.
    #[must_use]
    pub fn new(columns: &'a ColumnMap<E>) -> Self {
        Self::from_select(columns, E::find())
    }

    /// Start from a caller-prepared statement, e.g. one that already joins other tables.
    #[must_use]
    pub const fn from_select(columns: &'a ColumnMap<E>, select: Select<E>) -> Self {
        Self { columns, select }
    }

    /// Apply every group of `params` in the fixed order and return the statement.
    ///
    /// # Errors
    ///
    /// Propagates unknown columns and values that cannot be coerced.
    pub fn build(self, params: &ExtractedParams) -> Result<Select<E>, CrudError> {
        let mut builder = self;
        for filter in &params.filters {
            builder = builder.filter(filter)?;
        }
        for interval in &params.intervals {
            builder = builder.interval(interval)?;
        }
        Ok(builder.search(&params.search)?.sort(&params.sort)?.finish())
    }

    /// Equality for scalars, `IN` for lists.
    ///
    /// # Errors
    ///
    /// Propagates [`compile_filter`] errors.
    pub fn filter(mut self, filter: &Filter) -> Result<Self, CrudError> {
        let expr = compile_filter(self.columns, filter)?;
        self.select = self.select.filter(expr);
        Ok(self)
    }

    /// `col >= start` and/or `col < end`; a missing bound adds nothing.
    ///
    /// # Errors
    ///
    /// Propagates [`compile_filter`] errors.
    pub fn interval(mut self, interval: &IntervalSpec) -> Result<Self, CrudError> {
        let bounds = [(Operator::Ge, &interval.start), (Operator::Lt, &interval.end)];
        for (operator, bound) in bounds {
            if let Some(value) = bound {
                let filter = Filter::new(interval.column.clone(), operator, value.clone());
                self.select = self.select.filter(compile_filter(self.columns, &filter)?);
            }
        }
        Ok(self)
    }

    /// All search terms OR-ed into one condition. No terms, no condition.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::UnknownColumn`] for a column the entity does not have.
    pub fn search(mut self, terms: &[SearchSpec]) -> Result<Self, CrudError> {
        if terms.is_empty() {
            return Ok(self);
        }
        let mut any = Condition::any();
        for term in terms {
            let field = *self.columns.resolve(&term.column)?;
            any = any.add(ilike(field, &term.substring));
        }
        self.select = self.select.filter(any);
        Ok(self)
    }

    /// Ordering clauses, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::UnknownColumn`] for a column the entity does not have.
    pub fn sort(mut self, specs: &[SortSpec]) -> Result<Self, CrudError> {
        for spec in specs {
            let field = self.columns.resolve(&spec.column)?;
            self.select = self
                .select
                .order_by(field.column, Order::from(spec.direction));
        }
        Ok(self)
    }

    /// Add an already-lowered condition.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.select = self.select.filter(condition);
        self
    }

    #[must_use]
    pub fn finish(self) -> Select<E> {
        self.select
    }
}

/// JSON-shaped query: `{"limit", "offset", "where", "order_by": [{"col", "opr"}]}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySpec {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub filter: Option<FilterTree>,
    pub order_by: Vec<SortSpec>,
}

impl QuerySpec {
    /// # Errors
    ///
    /// Returns [`CrudError::Validation`] for malformed input, plus anything
    /// [`FilterTree::from_json`] rejects.
    pub fn from_json(value: &JsonValue) -> Result<Self, CrudError> {
        let JsonValue::Object(query) = value else {
            return Err(CrudError::validation("Query must be an object."));
        };

        let number = |key: &str| -> Result<Option<u64>, CrudError> {
            query
                .get(key)
                .map(|v| {
                    v.as_u64().ok_or_else(|| {
                        CrudError::validation(format!(
                            "Field <{key}> contain value <{}>. Expected a non-negative integer.",
                            display_json(v)
                        ))
                    })
                })
                .transpose()
        };

        let filter = query.get("where").map(FilterTree::from_json).transpose()?;

        let mut order_by = Vec::new();
        if let Some(clauses) = query.get("order_by") {
            let JsonValue::Array(clauses) = clauses else {
                return Err(CrudError::validation("Field <order_by> must contain a list."));
            };
            for clause in clauses {
                let column = clause
                    .get("col")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| CrudError::validation("Ordering clause is missing <col>."))?;
                let direction = match clause.get("opr") {
                    Some(opr) => Direction::from_param(column, opr)?,
                    None => Direction::Asc,
                };
                order_by.push(SortSpec::new(column, direction));
            }
        }

        Ok(Self {
            limit: number("limit")?,
            offset: number("offset")?,
            filter,
            order_by,
        })
    }

    /// Lower onto `base` (or `E::find()`).
    ///
    /// # Errors
    ///
    /// Propagates [`compile_tree`] errors and unknown sort columns.
    pub fn to_select<E: EntityTrait>(
        &self,
        columns: &ColumnMap<E>,
        base: Option<Select<E>>,
    ) -> Result<Select<E>, CrudError> {
        let mut builder = StatementBuilder::from_select(columns, base.unwrap_or_else(E::find));
        if let Some(tree) = &self.filter {
            builder = builder.condition(compile_tree(columns, tree)?);
        }
        let mut select = builder.sort(&self.order_by)?.finish();
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }
        if let Some(offset) = self.offset {
            select = select.offset(offset);
        }
        Ok(select)
    }
}
