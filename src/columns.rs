//! Typed access to an entity's columns.
//!
//! A [`ColumnMap`] is built once per entity from `E::Column::iter()` and maps each column
//! name to its Sea-ORM column and a [`FieldKind`]. The kind drives how raw parameter values
//! (usually strings from a query string) are coerced into bound SQL values.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn, Value,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::errors::CrudError;

/// Value family of a column, used to coerce incoming parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Bool,
    Uuid,
    DateTimeTz,
    DateTime,
    Date,
    Other,
}

impl FieldKind {
    #[must_use]
    pub fn of(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::String,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => Self::Float,
            ColumnType::Boolean => Self::Bool,
            ColumnType::Uuid => Self::Uuid,
            ColumnType::TimestampWithTimeZone => Self::DateTimeTz,
            ColumnType::DateTime | ColumnType::Timestamp => Self::DateTime,
            ColumnType::Date => Self::Date,
            _ => Self::Other,
        }
    }

    /// Whether `ilike` search makes sense on this kind.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Other)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Field<C> {
    pub column: C,
    pub kind: FieldKind,
}

/// Column name → typed field, for one entity.
pub struct ColumnMap<E: EntityTrait> {
    fields: HashMap<String, Field<E::Column>>,
    order: Vec<String>,
}

impl<E: EntityTrait> Clone for ColumnMap<E> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            order: self.order.clone(),
        }
    }
}

impl<E: EntityTrait> std::fmt::Debug for ColumnMap<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnMap").field("columns", &self.order).finish()
    }
}

impl<E: EntityTrait> Default for ColumnMap<E> {
    fn default() -> Self {
        Self::of_entity()
    }
}

impl<E: EntityTrait> ColumnMap<E> {
    #[must_use]
    pub fn of_entity() -> Self {
        let mut fields = HashMap::new();
        let mut order = Vec::new();
        for column in E::Column::iter() {
            let name = column.as_str().to_owned();
            let kind = FieldKind::of(column.def().get_column_type());
            order.push(name.clone());
            fields.insert(name, Field { column, kind });
        }
        Self { fields, order }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field<E::Column>> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Like [`get`](Self::get) but an unknown name is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::UnknownColumn`] when the entity has no such column.
    pub fn resolve(&self, name: &str) -> Result<&Field<E::Column>, CrudError> {
        self.get(name).ok_or_else(|| CrudError::unknown_column(name))
    }

    /// Column names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// First primary key column, if the entity declares one.
    #[must_use]
    pub fn primary_key(&self) -> Option<Field<E::Column>> {
        let column = E::PrimaryKey::iter().next()?.into_column();
        self.get(column.as_str()).copied()
    }

    /// Name of the first primary key column, borrowed from the map.
    #[must_use]
    pub fn primary_key_name(&self) -> Option<&str> {
        let column = E::PrimaryKey::iter().next()?.into_column();
        let name = column.as_str();
        self.names().find(|candidate| *candidate == name)
    }
}

fn mismatch(field: &str, kind: FieldKind, value: &JsonValue) -> CrudError {
    CrudError::validation(format!(
        "Field <{field}> contain value <{}>. Expected a value of type {kind:?}.",
        display_json(value)
    ))
}

pub(crate) fn display_json(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_datetime_tz(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| parse_datetime_tz(s).map(|dt| dt.naive_utc()))
}

/// Coerce a JSON value into a bound SQL value of the given kind.
///
/// Strings are parsed for non-string kinds, so `"5"` works for an integer column and
/// `"2024-01-01T00:00:00Z"` for a timestamp column.
///
/// # Errors
///
/// Returns [`CrudError::Validation`] naming `field` when the value cannot be represented.
pub fn coerce(field: &str, kind: FieldKind, value: &JsonValue) -> Result<Value, CrudError> {
    let err = || mismatch(field, kind, value);
    let coerced = match (kind, value) {
        (FieldKind::String, JsonValue::String(s)) => Value::from(s.clone()),
        (FieldKind::String, JsonValue::Number(n)) => Value::from(n.to_string()),
        (FieldKind::String, JsonValue::Bool(b)) => Value::from(b.to_string()),

        (FieldKind::Integer, JsonValue::Number(n)) => Value::from(n.as_i64().ok_or_else(err)?),
        (FieldKind::Integer, JsonValue::String(s)) => {
            Value::from(s.trim().parse::<i64>().map_err(|_| err())?)
        }

        (FieldKind::Float, JsonValue::Number(n)) => Value::from(n.as_f64().ok_or_else(err)?),
        (FieldKind::Float, JsonValue::String(s)) => {
            Value::from(s.trim().parse::<f64>().map_err(|_| err())?)
        }

        (FieldKind::Bool, JsonValue::Bool(b)) => Value::from(*b),
        (FieldKind::Bool, JsonValue::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Value::from(true),
            "false" | "0" => Value::from(false),
            _ => return Err(err()),
        },

        (FieldKind::Uuid, JsonValue::String(s)) => {
            Value::from(Uuid::parse_str(s.trim()).map_err(|_| err())?)
        }

        (FieldKind::DateTimeTz, JsonValue::String(s)) => {
            Value::from(parse_datetime_tz(s.trim()).ok_or_else(err)?)
        }
        (FieldKind::DateTime, JsonValue::String(s)) => {
            Value::from(parse_naive_datetime(s.trim()).ok_or_else(err)?)
        }
        (FieldKind::Date, JsonValue::String(s)) => {
            Value::from(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| err())?)
        }

        (FieldKind::Other, JsonValue::String(s)) => Value::from(s.clone()),
        (FieldKind::Other, JsonValue::Bool(b)) => Value::from(*b),
        (FieldKind::Other, JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => Value::from(n.as_f64().ok_or_else(err)?),
        },

        _ => return Err(err()),
    };
    Ok(coerced)
}
