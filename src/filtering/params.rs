//! Extraction of filter/interval/search/sort groups from a flat parameter mapping.
//!
//! Two request styles are supported:
//!
//! - **suffix style** (`extract_params`): `<col>=v`, `start_<col>=v`, `end_<col>=v`,
//!   `search_<col>=v`, `sort_<col>=asc|desc`, and `search=q` across every searchable column.
//! - **operator-prefix style** (`extract_operator_params`): `<opr>__<col>=v` with
//!   `opr` one of `lt le eq ne ge gt in contain sort`.
//!
//! Parameters naming a column outside the relevant allow-list are dropped, never rejected.
//! The mapping's own order is kept, so sort clauses apply in the order the caller sent them.

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::predicate::{Filter, Operator};
use super::sort::{Direction, SortSpec};
use super::statement::{IntervalSpec, SearchSpec};
use crate::columns::display_json;
use crate::errors::CrudError;
use crate::meta::ListSettings;

/// Keys handled by pagination/serialization rather than the statement builder.
pub const RESERVED_KEYS: [&str; 6] = ["page", "per_page", "ids", "fields", "include_metadata", "search"];

const START_PREFIX: &str = "start_";
const END_PREFIX: &str = "end_";
const SEARCH_PREFIX: &str = "search_";
const SORT_PREFIX: &str = "sort_";
const OPERATOR_SEPARATOR: &str = "__";

#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Parameter groups ready for the statement builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedParams {
    pub filters: Vec<Filter>,
    pub intervals: Vec<IntervalSpec>,
    pub search: Vec<SearchSpec>,
    pub sort: Vec<SortSpec>,
}

impl ExtractedParams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.intervals.is_empty()
            && self.search.is_empty()
            && self.sort.is_empty()
    }

    fn interval_mut(&mut self, column: &str) -> &mut IntervalSpec {
        let position = self.intervals.iter().position(|i| i.column == column);
        let index = position.unwrap_or_else(|| {
            self.intervals.push(IntervalSpec {
                column: column.to_string(),
                start: None,
                end: None,
            });
            self.intervals.len() - 1
        });
        &mut self.intervals[index]
    }

    /// `search=q` expands to one search term per searchable column.
    fn push_global_search(&mut self, value: &JsonValue, settings: &ListSettings) {
        let query = display_json(value);
        if query.is_empty() {
            return;
        }
        for column in &settings.searchable {
            self.search.push(SearchSpec::new(column.clone(), query.clone()));
        }
    }

    fn push_ids(&mut self, value: &JsonValue, id_column: Option<&str>) {
        match id_column {
            Some(id) => self.filters.push(Filter::new(id, Operator::In, value.clone())),
            None => debug!("Dropping <ids>: entity has no primary key column"),
        }
    }
}

/// Suffix-style extraction.
///
/// # Errors
///
/// Returns [`CrudError::InvalidSortDirection`] when an allowed `sort_<col>` parameter
/// carries anything other than `asc`/`desc`.
pub fn extract_params(
    params: &Map<String, JsonValue>,
    settings: &ListSettings,
    id_column: Option<&str>,
) -> Result<ExtractedParams, CrudError> {
    let mut extracted = ExtractedParams::default();

    for (key, value) in params {
        match key.as_str() {
            "search" => {
                extracted.push_global_search(value, settings);
                continue;
            }
            "ids" => {
                extracted.push_ids(value, id_column);
                continue;
            }
            reserved if is_reserved(reserved) => continue,
            _ => {}
        }

        let mut used = false;

        if settings.is_filterable(key) {
            extracted
                .filters
                .push(Filter::new(key.clone(), Operator::Eq, value.clone()));
            used = true;
        }
        if let Some(column) = key.strip_prefix(START_PREFIX)
            && settings.is_interval_filterable(column)
        {
            extracted.interval_mut(column).start = Some(value.clone());
            used = true;
        }
        if let Some(column) = key.strip_prefix(END_PREFIX)
            && settings.is_interval_filterable(column)
        {
            extracted.interval_mut(column).end = Some(value.clone());
            used = true;
        }
        if let Some(column) = key.strip_prefix(SEARCH_PREFIX)
            && settings.is_searchable(column)
        {
            extracted
                .search
                .push(SearchSpec::new(column, display_json(value)));
            used = true;
        }
        if let Some(column) = key.strip_prefix(SORT_PREFIX)
            && settings.is_sortable(column)
        {
            let direction = Direction::from_param(key, value)?;
            extracted.sort.push(SortSpec::new(column, direction));
            used = true;
        }

        if !used {
            debug!(parameter = %key, "Dropping parameter outside the allow-lists");
        }
    }

    Ok(extracted)
}

/// Operator-prefix extraction (`<opr>__<col>`).
///
/// `contain` becomes an AND-ed case-insensitive substring filter; `search=q` still expands
/// to an OR across searchable columns.
///
/// # Errors
///
/// Returns [`CrudError::PrefixNotAllowed`] for an unknown prefix or a key without `__`,
/// and [`CrudError::InvalidSortDirection`] for a bad `sort__<col>` value.
pub fn extract_operator_params(
    params: &Map<String, JsonValue>,
    settings: &ListSettings,
    id_column: Option<&str>,
) -> Result<ExtractedParams, CrudError> {
    let mut extracted = ExtractedParams::default();

    for (key, value) in params {
        match key.as_str() {
            "search" => {
                extracted.push_global_search(value, settings);
                continue;
            }
            "ids" => {
                extracted.push_ids(value, id_column);
                continue;
            }
            reserved if is_reserved(reserved) => continue,
            _ => {}
        }

        let Some((prefix, column)) = key.split_once(OPERATOR_SEPARATOR) else {
            return Err(CrudError::PrefixNotAllowed {
                prefix: key.clone(),
            });
        };

        let allowed = match prefix {
            "eq" | "ne" | "in" => settings.is_filterable(column),
            "lt" | "le" | "ge" | "gt" => {
                settings.is_filterable(column) || settings.is_interval_filterable(column)
            }
            "contain" => settings.is_searchable(column),
            "sort" => settings.is_sortable(column),
            _ => {
                return Err(CrudError::PrefixNotAllowed {
                    prefix: prefix.to_string(),
                });
            }
        };
        if !allowed {
            debug!(parameter = %key, "Dropping parameter outside the allow-lists");
            continue;
        }

        match prefix {
            "sort" => {
                let direction = Direction::from_param(key, value)?;
                extracted.sort.push(SortSpec::new(column, direction));
            }
            "contain" => extracted
                .filters
                .push(Filter::new(column, Operator::Ilike, value.clone())),
            operator => {
                let operator = operator.parse()?;
                extracted
                    .filters
                    .push(Filter::new(column, operator, value.clone()));
            }
        }
    }

    Ok(extracted)
}
