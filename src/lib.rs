//! # querycrate
//!
//! Filtered, sorted and paginated CRUD controllers on top of Sea-ORM.
//!
//! A controller is a [`CrudResource`] (entity plus payload types) and its [`Meta`]
//! options: the database connection, which columns may be filtered, interval-filtered,
//! sorted and searched, and the page size limits. From there:
//!
//! - [`filtering`] turns request parameters into a `Select` statement
//! - [`pagination`] counts and slices it into an `{items, _metadata}` envelope
//! - [`pipeline`] runs validate, act and serialize for writes and custom actions
//! - [`routes`] exposes the controller through axum
//!
//! ```rust,ignore
//! let meta = Meta::<parent::Entity>::builder()
//!     .connection(db)
//!     .filterable(["first", "rank"])
//!     .interval_filterable(["created_at"])
//!     .sortable(["rank", "created_at"])
//!     .searchable(["first", "second"])
//!     .max_per_page(50)
//!     .build()?;
//! let controller = Arc::new(Controller::<Parents>::new(meta)?);
//!
//! let page = controller.paginate(&params_from_pairs([("search", "seven"), ("include_metadata", "true")])).await?;
//! let app = Router::new().nest("/parents", routes::router(controller));
//! ```

pub mod columns;
pub mod core;
pub mod errors;
pub mod filtering;
pub mod meta;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod routes;
pub mod serialization;
pub mod validation;

#[cfg(test)]
mod test_entity;

pub use columns::{ColumnMap, Field, FieldKind};
pub use crate::core::{Controller, CrudResource, MergeIntoActiveModel, ModelOf};
pub use errors::{CrudError, ErrorKind};
pub use filtering::{
    Direction, ExtractedParams, Filter, FilterTree, Operator, QuerySpec, SortSpec,
    StatementBuilder, extract_operator_params, extract_params,
};
pub use meta::{ListSettings, Meta, MetaBuilder};
pub use models::{ListParams, ListRequest, params_from_pairs};
pub use pagination::{Envelope, Metadata, PageRequest, Pagination, Paginator};
pub use pipeline::{Action, WebAction, run_pipeline};
pub use serialization::dump;
pub use validation::{Validatable, ValidationError, ValidationErrors};
