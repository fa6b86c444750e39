use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::IntoParams;

use crate::errors::CrudError;
use crate::filtering::params::is_reserved;
use crate::meta::ListSettings;
use crate::pagination::PageRequest;

/// Reserved query parameters of a listing endpoint.
///
/// Every other parameter is matched against the controller's allow-lists:
///
/// - `<col>=v` filters by equality (repeat the key for `IN`)
/// - `start_<col>=v` / `end_<col>=v` bound an interval (`>=` / `<`)
/// - `search_<col>=v` searches one column, case-insensitively
/// - `sort_<col>=asc|desc` orders the result, in the order parameters are given
///
/// Operator-prefix endpoints use `<opr>__<col>=v` instead, with `opr` one of
/// `lt le eq ne ge gt in contain sort`.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page number, starting at 1.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[param(example = 1)]
    pub page: Option<i64>,
    /// Rows per page. Values above the controller's maximum are capped.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[param(example = 20)]
    pub per_page: Option<i64>,
    /// `true`, `1` or `enable` adds `_metadata.pagination` to the response.
    #[param(value_type = Option<String>, example = "enable")]
    pub include_metadata: Option<Value>,
    /// Fields to keep in each item, as a comma-separated list.
    #[param(value_type = Option<String>, example = "id,first")]
    pub fields: Option<Value>,
    /// Primary keys to restrict the listing to, as a comma-separated list.
    #[param(value_type = Option<String>)]
    pub ids: Option<Value>,
    /// Substring searched across every searchable column.
    #[param(value_type = Option<String>)]
    pub search: Option<Value>,
}

/// Pagination and output options of one listing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    pub page: i64,
    pub per_page: i64,
    pub include_metadata: bool,
    pub fields: Option<Vec<String>>,
}

impl ListRequest {
    /// Parse the reserved keys of `params`, falling back to `settings` for the page size.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Validation`] when `page`/`per_page` are not integers,
    /// `include_metadata` is not a recognised flag or `fields` is not a list of names.
    pub fn from_params(
        params: &Map<String, Value>,
        settings: &ListSettings,
    ) -> Result<Self, CrudError> {
        let reserved: Map<String, Value> = params
            .iter()
            .filter(|(key, _)| is_reserved(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let raw: ListParams = serde_json::from_value(Value::Object(reserved))
            .map_err(|e| CrudError::validation(format!("Invalid list parameters: {e}")))?;

        Ok(Self {
            page: raw.page.unwrap_or(1),
            per_page: raw.per_page.unwrap_or(settings.per_page),
            include_metadata: raw
                .include_metadata
                .as_ref()
                .map(parse_flag)
                .transpose()?
                .unwrap_or(false),
            fields: raw.fields.as_ref().map(parse_fields).transpose()?,
        })
    }

    #[must_use]
    pub const fn page_request(&self, settings: &ListSettings) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
            .with_max_per_page(settings.max_per_page)
            .with_metadata(self.include_metadata)
    }
}

fn parse_flag(value: &Value) -> Result<bool, CrudError> {
    let invalid = || {
        CrudError::validation(format!(
            "Field <include_metadata> contain value <{value}>. But must contain value <true>, <false> or <enable>."
        ))
    };
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(invalid()),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "enable" => Ok(true),
            "false" | "0" | "" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn parse_fields(value: &Value) -> Result<Vec<String>, CrudError> {
    let invalid = || CrudError::validation("Field <fields> must contain a list of field names.");
    match value {
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(ToString::to_string)
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(ToString::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// Turn URL query pairs into the ordered parameter mapping the extractors consume.
/// A repeated key collects its values into a list.
#[must_use]
pub fn params_from_pairs<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut params = Map::new();
    for (key, value) in pairs {
        let key = key.into();
        let value = Value::String(value.into());
        if let Some(existing) = params.get_mut(&key) {
            match existing {
                Value::Array(items) => items.push(value),
                other => {
                    let first = other.take();
                    *other = Value::Array(vec![first, value]);
                }
            }
        } else {
            params.insert(key, value);
        }
    }
    params
}
