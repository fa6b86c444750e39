//! Filter specifications and their lowering to Sea-ORM expressions.

use std::str::FromStr;

use sea_orm::{
    ColumnTrait, Condition, EntityTrait,
    sea_query::SimpleExpr,
};
use serde_json::Value as JsonValue;

use super::search::ilike;
use crate::columns::{ColumnMap, coerce, display_json};
use crate::errors::CrudError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    In,
    Ilike,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Ge => "ge",
            Self::Gt => "gt",
            Self::In => "in",
            Self::Ilike => "ilike",
        }
    }
}

impl FromStr for Operator {
    type Err = CrudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "lt" => Self::Lt,
            "le" => Self::Le,
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "ge" => Self::Ge,
            "gt" => Self::Gt,
            "in" => Self::In,
            "ilike" => Self::Ilike,
            other => {
                return Err(CrudError::UnsupportedOperator {
                    operator: other.to_string(),
                });
            }
        })
    }
}

/// One `column <operator> value` predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operator: Operator,
    pub value: JsonValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<JsonValue>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Nested filter groups.
///
/// JSON shape: `{"col": .., "opr": .., "value": ..}` for a leaf, `{"and": [..]}` or
/// `{"or": [..]}` for a group.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterTree {
    Filter(Filter),
    And(Vec<FilterTree>),
    Or(Vec<FilterTree>),
}

impl From<Filter> for FilterTree {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl FilterTree {
    /// Parse the JSON shape described on [`FilterTree`].
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Validation`] for malformed nodes and
    /// [`CrudError::UnsupportedOperator`] for an unknown `opr`.
    pub fn from_json(value: &JsonValue) -> Result<Self, CrudError> {
        let JsonValue::Object(node) = value else {
            return Err(CrudError::validation(format!(
                "Filter must be an object, got <{value}>."
            )));
        };

        let groups: [(&str, fn(Vec<Self>) -> Self); 2] = [("and", Self::And), ("or", Self::Or)];
        for (key, make) in groups {
            if let Some(children) = node.get(key) {
                let JsonValue::Array(children) = children else {
                    return Err(CrudError::validation(format!(
                        "Filter group <{key}> must contain a list."
                    )));
                };
                let children = children
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(make(children));
            }
        }

        let column = node
            .get("col")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CrudError::validation("Filter is missing <col>."))?;
        let operator = node
            .get("opr")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CrudError::validation("Filter is missing <opr>."))?
            .parse()?;
        let value = node.get("value").cloned().unwrap_or(JsonValue::Null);

        Ok(Self::Filter(Filter::new(column, operator, value)))
    }
}

/// Items of a list-valued parameter. A comma-separated string is split.
pub(crate) fn list_items(value: &JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items.clone(),
        JsonValue::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| JsonValue::String(item.to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}

/// Lower a single filter to an expression on the entity's table.
///
/// # Errors
///
/// Unknown columns, values that cannot be coerced to the column type and lists given to
/// ordering operators are rejected before anything touches the database.
pub fn compile_filter<E: EntityTrait>(
    columns: &ColumnMap<E>,
    filter: &Filter,
) -> Result<SimpleExpr, CrudError> {
    let field = *columns.resolve(&filter.column)?;
    let column = field.column;
    let name = filter.column.as_str();

    let coerce_all = |items: Vec<JsonValue>| {
        items
            .iter()
            .map(|item| coerce(name, field.kind, item))
            .collect::<Result<Vec<_>, _>>()
    };

    let expr = match (filter.operator, &filter.value) {
        (Operator::In, value) => column.is_in(coerce_all(list_items(value))?),
        (Operator::Eq, JsonValue::Array(items)) => column.is_in(coerce_all(items.clone())?),
        (Operator::Ne, JsonValue::Array(items)) => column.is_not_in(coerce_all(items.clone())?),
        (operator, JsonValue::Array(_)) => {
            return Err(CrudError::validation(format!(
                "Operator <{}> does not accept a list for field <{name}>.",
                operator.as_str()
            )));
        }
        (Operator::Eq, JsonValue::Null) => column.is_null(),
        (Operator::Ne, JsonValue::Null) => column.is_not_null(),
        (operator, JsonValue::Null) => {
            return Err(CrudError::validation(format!(
                "Operator <{}> requires a value for field <{name}>.",
                operator.as_str()
            )));
        }
        (Operator::Ilike, value) => ilike(field, &display_json(value)),
        (operator, value) => {
            let value = coerce(name, field.kind, value)?;
            match operator {
                Operator::Lt => column.lt(value),
                Operator::Le => column.lte(value),
                Operator::Ne => column.ne(value),
                Operator::Ge => column.gte(value),
                Operator::Gt => column.gt(value),
                _ => column.eq(value),
            }
        }
    };
    Ok(expr)
}

/// Lower a filter tree to a condition. `and` groups become one conjunction.
///
/// # Errors
///
/// `or` groups are not supported and fail with [`CrudError::NotImplemented`]; leaf errors
/// from [`compile_filter`] propagate.
pub fn compile_tree<E: EntityTrait>(
    columns: &ColumnMap<E>,
    tree: &FilterTree,
) -> Result<Condition, CrudError> {
    match tree {
        FilterTree::Filter(filter) => Ok(Condition::all().add(compile_filter(columns, filter)?)),
        FilterTree::And(children) => children.iter().try_fold(Condition::all(), |cond, child| {
            Ok(cond.add(compile_tree(columns, child)?))
        }),
        FilterTree::Or(_) => Err(CrudError::NotImplemented("or".to_string())),
    }
}
