//! # Controller Options
//!
//! A controller is configured with a database connection and a [`ListSettings`] block:
//! allow-lists that decide which request parameters may reach the statement builder, and
//! page size limits.
//!
//! Settings can be written in code with [`MetaBuilder`] or loaded from any serde source:
//!
//! ```json
//! {
//!   "parents": {
//!     "filterable": ["first", "rank"],
//!     "interval_filterable": ["created_at"],
//!     "sortable": ["created_at", "rank"],
//!     "searchable": ["first", "second"],
//!     "per_page": 20,
//!     "max_per_page": 100
//!   }
//! }
//! ```
//!
//! Allow-lists are checked against the entity's columns when the controller is built, so a
//! typo fails at startup rather than silently filtering nothing.

use std::marker::PhantomData;

use sea_orm::{DatabaseConnection, EntityTrait, IdenStatic};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::columns::ColumnMap;
use crate::errors::CrudError;
use crate::pagination::{DEFAULT_MAX_PER_PAGE, DEFAULT_PER_PAGE};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListSettings {
    pub filterable: Vec<String>,
    pub interval_filterable: Vec<String>,
    pub sortable: Vec<String>,
    pub searchable: Vec<String>,
    pub per_page: i64,
    pub max_per_page: i64,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            filterable: Vec::new(),
            interval_filterable: Vec::new(),
            sortable: Vec::new(),
            searchable: Vec::new(),
            per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
        }
    }
}

impl ListSettings {
    /// Read the section named `controller` from a configuration document.
    ///
    /// # Errors
    ///
    /// [`CrudError::MetaNotFound`] when the section is missing, [`CrudError::Validation`]
    /// when it does not describe valid settings.
    pub fn from_config(config: &Value, controller: &str) -> Result<Self, CrudError> {
        let section = config.get(controller).ok_or_else(|| CrudError::MetaNotFound {
            controller: controller.to_string(),
        })?;
        serde_json::from_value(section.clone()).map_err(|e| {
            CrudError::validation(format!("Invalid configuration for <{controller}>: {e}"))
        })
    }

    #[must_use]
    pub fn is_filterable(&self, column: &str) -> bool {
        self.filterable.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn is_interval_filterable(&self, column: &str) -> bool {
        self.interval_filterable.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn is_searchable(&self, column: &str) -> bool {
        self.searchable.iter().any(|c| c == column)
    }

    /// Every allow-listed column must exist on the entity.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::UnknownColumn`] for the first name the entity lacks.
    pub fn check_columns<E: EntityTrait>(&self, columns: &ColumnMap<E>) -> Result<(), CrudError> {
        [
            &self.filterable,
            &self.interval_filterable,
            &self.sortable,
            &self.searchable,
        ]
        .into_iter()
        .flatten()
        .try_for_each(|name| columns.resolve(name).map(|_| ()))
    }
}

/// Resolved options of one controller.
pub struct Meta<E: EntityTrait> {
    connection: DatabaseConnection,
    settings: ListSettings,
    columns: ColumnMap<E>,
}

impl<E: EntityTrait> Meta<E> {
    #[must_use]
    pub fn builder() -> MetaBuilder<E> {
        MetaBuilder::new()
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    #[must_use]
    pub const fn settings(&self) -> &ListSettings {
        &self.settings
    }

    #[must_use]
    pub const fn columns(&self) -> &ColumnMap<E> {
        &self.columns
    }

    /// Name of the primary key column, used for the reserved `ids` parameter.
    #[must_use]
    pub fn id_column(&self) -> Option<&str> {
        self.columns.primary_key_name()
    }
}

pub struct MetaBuilder<E: EntityTrait> {
    connection: Option<DatabaseConnection>,
    settings: ListSettings,
    entity: PhantomData<E>,
}

impl<E: EntityTrait> Default for MetaBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> MetaBuilder<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connection: None,
            settings: ListSettings::default(),
            entity: PhantomData,
        }
    }

    #[must_use]
    pub fn connection(mut self, connection: DatabaseConnection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Replace all list settings at once, e.g. with [`ListSettings::from_config`].
    #[must_use]
    pub fn settings(mut self, settings: ListSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn filterable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.filterable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn interval_filterable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.interval_filterable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn sortable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.sortable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn searchable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.searchable = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn per_page(mut self, per_page: i64) -> Self {
        self.settings.per_page = per_page;
        self
    }

    #[must_use]
    pub fn max_per_page(mut self, max_per_page: i64) -> Self {
        self.settings.max_per_page = max_per_page;
        self
    }

    /// # Errors
    ///
    /// [`CrudError::OptionNotFound`] without a connection, [`CrudError::UnknownColumn`]
    /// when an allow-list names a column the entity does not have.
    pub fn build(self) -> Result<Meta<E>, CrudError> {
        let connection = self.connection.ok_or_else(|| CrudError::OptionNotFound {
            option: "session".to_string(),
        })?;
        let columns = ColumnMap::<E>::of_entity();
        self.settings.check_columns(&columns)?;

        Ok(Meta {
            connection,
            settings: self.settings,
            columns,
        })
    }
}
