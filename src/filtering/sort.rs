use sea_orm::sea_query::Order;
use serde_json::Value as JsonValue;

use crate::columns::display_json;
use crate::errors::CrudError;

/// Sort direction of one ordering clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parse the value of a sort parameter. `field` is the parameter name as the caller
    /// sent it (e.g. `sort_created_at`) so the error points at it.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::InvalidSortDirection`] for anything other than `asc`/`desc`.
    pub fn from_param(field: &str, value: &JsonValue) -> Result<Self, CrudError> {
        let raw = display_json(value);
        match raw.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CrudError::InvalidSortDirection {
                field: field.to_string(),
                value: raw,
            }),
        }
    }
}

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Self::Asc,
            Direction::Desc => Self::Desc,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: Direction,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }
}
