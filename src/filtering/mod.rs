//! # Filtering, Search & Sorting
//!
//! This module turns request parameters into a Sea-ORM `Select<E>`. Nothing here touches
//! the database: every function is pure and every failure is reported before execution.
//!
//! ## Main Components
//!
//! - **[`params`]**: splits a flat parameter mapping into filter, interval, search and sort
//!   groups, honouring the controller's allow-lists
//! - **[`predicate`]**: compiles `{column, operator, value}` filters and `and` groups
//! - **[`statement`]**: applies the groups to a base statement in a fixed order, plus the
//!   JSON-shaped [`QuerySpec`]
//! - **[`search`]**: case-insensitive substring matching with escaped wildcards
//!
//! ## Query Parameter Examples
//!
//! ### Suffix style
//! ```text
//! GET /parents?first=alpha                      first = 'alpha'
//! GET /parents?rank=1&rank=2                    rank IN (1, 2)
//! GET /parents?start_created_at=2024-01-01T00:00:00Z&end_created_at=2024-02-01T00:00:00Z
//! GET /parents?search_first=sev&search_second=sev   (first ILIKE .. OR second ILIKE ..)
//! GET /parents?search=seven                     every searchable column, OR-ed
//! GET /parents?sort_created_at=desc&sort_rank=asc
//! ```
//!
//! ### Operator-prefix style
//! ```text
//! GET /parents?ge__rank=2&lt__rank=8&contain__first=alp&sort__rank=desc
//! ```
//!
//! Unknown prefixes fail with `PrefixNotAllowed`; columns outside the allow-lists are
//! dropped silently in both styles.

pub mod params;
pub mod predicate;
pub mod search;
pub mod sort;
pub mod statement;

pub use params::{ExtractedParams, RESERVED_KEYS, extract_operator_params, extract_params};
pub use predicate::{Filter, FilterTree, Operator, compile_filter, compile_tree};
pub use search::{escape_like_wildcards, ilike};
pub use sort::{Direction, SortSpec};
pub use statement::{IntervalSpec, QuerySpec, SearchSpec, StatementBuilder};
