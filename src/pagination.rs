//! # Pagination
//!
//! [`Paginator`] wraps a filtered `Select<E>` with a [`PageRequest`] and produces an
//! [`Envelope`]:
//!
//! ```json
//! {"items": [...], "_metadata": {"pagination": {"page": 1, "per_page": 20, "pages": 3, "total": 41}}}
//! ```
//!
//! Pages are 1-indexed. `per_page` above `max_per_page` is clamped to it, a negative
//! `per_page` becomes 0 (no rows, `pages == 0`), and a `page` below 1 becomes 1. The count
//! query only runs when metadata was requested, and the row query is skipped entirely when
//! `per_page` is 0.

use sea_orm::{
    ConnectionTrait, EntityTrait, QuerySelect, QueryTrait, Select,
    sea_query::{Alias, Asterisk, Expr, SelectStatement},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::errors::CrudError;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const DEFAULT_MAX_PER_PAGE: i64 = 100;
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Requested page, before clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
    pub max_per_page: i64,
    pub include_metadata: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: i64, per_page: i64) -> Self {
        Self {
            page,
            per_page,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            include_metadata: false,
        }
    }

    #[must_use]
    pub const fn with_max_per_page(mut self, max_per_page: i64) -> Self {
        self.max_per_page = max_per_page;
        self
    }

    #[must_use]
    pub const fn with_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }

    #[must_use]
    pub fn effective_per_page(&self) -> u64 {
        let clamped = self.per_page.min(self.max_per_page).max(0);
        u64::try_from(clamped).unwrap_or(0)
    }

    #[must_use]
    pub fn effective_page(&self) -> u64 {
        u64::try_from(self.page.max(1)).unwrap_or(1)
    }

    /// Rows to skip, capped at `i64::MAX` since database drivers bind offsets as signed.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.effective_page() - 1)
            .saturating_mul(self.effective_per_page())
            .min(MAX_OFFSET)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub pages: u64,
    pub total: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: u64, per_page: u64, total: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            page,
            per_page,
            pages,
            total,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Metadata {
    pub pagination: Pagination,
}

/// Wire shape of a listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub items: Vec<T>,
    #[serde(rename = "_metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl<T> Envelope<T> {
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Envelope<U> {
        Envelope {
            items: self.items.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }

    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map_items<U, Err>(
        self,
        f: impl FnMut(T) -> Result<U, Err>,
    ) -> Result<Envelope<U>, Err> {
        Ok(Envelope {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            metadata: self.metadata,
        })
    }
}

pub struct Paginator<E: EntityTrait> {
    select: Select<E>,
    request: PageRequest,
}

impl<E: EntityTrait> Paginator<E> {
    #[must_use]
    pub const fn new(select: Select<E>, request: PageRequest) -> Self {
        Self { select, request }
    }

    #[must_use]
    pub const fn request(&self) -> &PageRequest {
        &self.request
    }

    /// The filtered statement with its projection replaced by `COUNT(*) AS total` and its
    /// ordering removed.
    #[must_use]
    pub fn count_statement(&self) -> SelectStatement {
        let mut query = self.select.clone().into_query();
        query
            .clear_selects()
            .expr_as(Expr::col(Asterisk).count(), Alias::new("total"));
        query.clear_order_by();
        query
    }

    /// The page's rows, or `None` when there is nothing to fetch.
    #[must_use]
    pub fn page_select(&self) -> Option<Select<E>> {
        let per_page = self.request.effective_per_page();
        if per_page == 0 {
            return None;
        }
        Some(
            self.select
                .clone()
                .limit(per_page)
                .offset(self.request.offset()),
        )
    }

    /// Number of rows matching the filters, independent of the requested page.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn count<C: ConnectionTrait>(&self, conn: &C) -> Result<u64, CrudError> {
        let stmt = conn.get_database_backend().build(&self.count_statement());
        debug!(sql = %stmt, "Counting rows for pagination");
        let total = match conn.query_one(stmt).await? {
            Some(row) => row.try_get::<i64>("", "total")?,
            None => 0,
        };
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Run the count (if metadata was requested) and the page query.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn fetch<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<Envelope<E::Model>, CrudError> {
        let metadata = if self.request.include_metadata {
            let total = self.count(conn).await?;
            Some(Metadata {
                pagination: Pagination::new(
                    self.request.effective_page(),
                    self.request.effective_per_page(),
                    total,
                ),
            })
        } else {
            None
        };

        let items = match self.page_select() {
            Some(select) => {
                debug!(
                    sql = %select.build(conn.get_database_backend()),
                    "Fetching page"
                );
                select.all(conn).await?
            }
            None => Vec::new(),
        };

        Ok(Envelope { items, metadata })
    }
}
