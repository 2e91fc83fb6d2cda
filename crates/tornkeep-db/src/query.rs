//! Query Gateway: paginated, filtered, sorted reads over catalogued tables.
//!
//! Table and column names are resolved against [`crate::catalog`] before any
//! SQL is built; values are always bound. The gateway runs on the read-only
//! pool, so the engine itself refuses writes. Each call reads the total
//! count and one page inside a single read transaction and holds nothing
//! between calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, ValueRef};

use crate::catalog::{self, ColumnSpec, ColumnType, TableSpec};
use crate::error::QueryError;
use crate::filter::{self, Filter, Literal, OrderBy};
use crate::render::{self, Cell};
use crate::sqlite::from_unix;

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default upper bound on rows per page.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 200;

/// Default display length for text cells.
pub const DEFAULT_MAX_TEXT_LEN: usize = 50;

/// Default read deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Result shaping and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Page size used when the request names none.
    pub default_page_size: u32,
    /// Requested page sizes are clamped to `1..=max_page_size`.
    pub max_page_size: u32,
    /// Text cells longer than this many characters are truncated.
    pub max_text_len: usize,
    /// Deadline for one call.
    pub timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// One read request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Table name; must be in the allow-list.
    pub table: String,
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: i64,
    /// Rows per page; clamped to the configured maximum. Also accepted as
    /// `limit`.
    #[serde(default, alias = "limit")]
    pub page_size: Option<i64>,
    /// `column [ASC|DESC]`.
    #[serde(default)]
    pub order_by: Option<String>,
    /// `column op literal`.
    #[serde(default)]
    pub filter: Option<String>,
    /// Deadline for this call in milliseconds; never longer than the
    /// configured timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

const fn first_page() -> i64 {
    1
}

impl QueryRequest {
    /// First page of `table` with default size, ordering and no filter.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            page: 1,
            page_size: None,
            order_by: None,
            filter: None,
            timeout_ms: None,
        }
    }

    /// Set the page number.
    #[must_use]
    pub const fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn page_size(mut self, size: i64) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Set the filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set a per-call deadline.
    #[must_use]
    pub const fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// One page of rendered rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedRows {
    /// Table read.
    pub table: &'static str,
    /// Column names in row order.
    pub columns: Vec<&'static str>,
    /// Rendered rows.
    pub rows: Vec<Vec<Cell>>,
    /// Page returned.
    pub page: i64,
    /// Effective page size after clamping.
    pub page_size: i64,
    /// Rows matching the filter across all pages.
    pub total_count: i64,
    /// Pages needed for `total_count` rows.
    pub total_pages: i64,
}

/// An allow-listed table present in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    /// Table name.
    pub name: &'static str,
    /// Number of columns.
    pub column_count: usize,
}

/// The request's deadline, capped by the configured timeout.
fn deadline(config: &QueryConfig, request: &QueryRequest) -> Duration {
    request.timeout_ms.map_or(config.timeout, |ms| {
        Duration::from_millis(ms).min(config.timeout)
    })
}

/// A fully validated request.
struct Plan {
    table: &'static TableSpec,
    page: i64,
    page_size: i64,
    offset: i64,
    order: Option<OrderBy>,
    filter: Option<Filter>,
}

/// Read-only access to every catalogued table.
pub struct QueryGateway<'a> {
    pool: &'a SqlitePool,
    config: &'a QueryConfig,
}

impl<'a> QueryGateway<'a> {
    /// Create a gateway over a (read-only) pool.
    pub const fn new(pool: &'a SqlitePool, config: &'a QueryConfig) -> Self {
        Self { pool, config }
    }

    /// Read one page.
    ///
    /// # Errors
    ///
    /// - [`QueryError::UnknownTable`] for a table outside the allow-list
    /// - [`QueryError::InvalidPage`] for `page < 1`
    /// - [`QueryError::UnknownColumn`], [`QueryError::Malformed`] or
    ///   [`QueryError::TypeMismatch`] for a bad ordering or filter
    /// - [`QueryError::Timeout`] if the deadline passes first
    /// - [`QueryError::Database`] if the engine fails
    pub async fn query(&self, request: &QueryRequest) -> Result<PagedRows, QueryError> {
        let plan = self.plan(request)?;
        let deadline = deadline(self.config, request);
        match tokio::time::timeout(deadline, self.run(&plan)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                let ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(table = plan.table.name, timeout_ms = ms, "Query timed out");
                Err(QueryError::Timeout(ms))
            }
        }
    }

    /// Allow-listed tables that exist in the file, with their column counts.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Database`] if the engine fails.
    pub async fn list_tables(&self) -> Result<Vec<TableInfo>, QueryError> {
        let present: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(self.pool)
                .await?;
        Ok(catalog::ALL_TABLES
            .into_iter()
            .filter(|t| present.iter().any(|name| name == t.name))
            .map(|t| TableInfo {
                name: t.name,
                column_count: t.columns.len(),
            })
            .collect())
    }

    fn plan(&self, request: &QueryRequest) -> Result<Plan, QueryError> {
        let table = catalog::table(&request.table)
            .ok_or_else(|| QueryError::UnknownTable(request.table.clone()))?;
        if request.page < 1 {
            return Err(QueryError::InvalidPage(request.page));
        }
        let max = i64::from(self.config.max_page_size.max(1));
        let page_size = request
            .page_size
            .unwrap_or_else(|| i64::from(self.config.default_page_size))
            .clamp(1, max);
        let offset = request
            .page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(page_size))
            .ok_or(QueryError::InvalidPage(request.page))?;
        let order = request
            .order_by
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| filter::parse_order_by(table, s))
            .transpose()?;
        let filter = request
            .filter
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| filter::parse_filter(table, s))
            .transpose()?;
        Ok(Plan {
            table,
            page: request.page,
            page_size,
            offset,
            order,
            filter,
        })
    }

    async fn run(&self, plan: &Plan) -> Result<PagedRows, QueryError> {
        let table = plan.table;
        let mut tx = self.pool.begin().await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        count.push(table.name);
        push_where(&mut count, plan.filter.as_ref());
        let total_count: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT ");
        {
            let mut columns = select.separated(", ");
            for column in table.columns {
                columns.push(column.name);
            }
        }
        select.push(" FROM ").push(table.name);
        push_where(&mut select, plan.filter.as_ref());
        select.push(" ORDER BY ");
        if let Some(order) = plan.order.filter(|o| o.column.name != table.primary_key) {
            select
                .push(order.column.name)
                .push(" ")
                .push(order.direction())
                .push(", ");
        }
        let pk_direction = plan
            .order
            .filter(|o| o.column.name == table.primary_key)
            .map_or("ASC", |o| o.direction());
        select
            .push(table.primary_key)
            .push(" ")
            .push(pk_direction)
            .push(" LIMIT ")
            .push_bind(plan.page_size)
            .push(" OFFSET ")
            .push_bind(plan.offset);
        let raw = select.build().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let rows = raw
            .iter()
            .map(|row| render_row(table, row, self.config.max_text_len))
            .collect::<Result<Vec<_>, _>>()?;
        let total_pages = if total_count == 0 {
            0
        } else {
            total_count
                .saturating_add(plan.page_size.saturating_sub(1))
                .checked_div(plan.page_size)
                .unwrap_or(0)
        };

        tracing::debug!(
            table = table.name,
            page = plan.page,
            page_size = plan.page_size,
            returned = rows.len(),
            total_count,
            "Served query"
        );

        Ok(PagedRows {
            table: table.name,
            columns: table.columns.iter().map(|c| c.name).collect(),
            rows,
            page: plan.page,
            page_size: plan.page_size,
            total_count,
            total_pages,
        })
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Sqlite>, filter: Option<&Filter>) {
    let Some(filter) = filter else {
        return;
    };
    qb.push(" WHERE ")
        .push(filter.column.name)
        .push(" ")
        .push(filter.op.as_sql());
    match &filter.value {
        Some(Literal::Integer(v)) => {
            qb.push(" ").push_bind(*v);
        }
        Some(Literal::Text(v)) => {
            qb.push(" ").push_bind(v.clone());
        }
        None => {}
    }
}

fn render_row(
    table: &TableSpec,
    row: &SqliteRow,
    max_text_len: usize,
) -> Result<Vec<Cell>, sqlx::Error> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| render_cell(column, row, index, max_text_len))
        .collect()
}

fn render_cell(
    column: &ColumnSpec,
    row: &SqliteRow,
    index: usize,
    max_text_len: usize,
) -> Result<Cell, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Cell::Null);
    }
    Ok(match column.ty {
        ColumnType::Integer => Cell::Integer(row.try_get(index)?),
        ColumnType::Timestamp => Cell::Timestamp(from_unix(row.try_get(index)?)),
        ColumnType::Text => {
            let text: String = row.try_get(index)?;
            Cell::Text(render::truncate(&text, max_text_len))
        }
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn request_deadline_never_exceeds_config() {
        let config = QueryConfig {
            timeout: Duration::from_millis(2_000),
            ..QueryConfig::default()
        };
        let plain = QueryRequest::new("players");
        assert_eq!(deadline(&config, &plain), Duration::from_millis(2_000));
        assert_eq!(
            deadline(&config, &plain.clone().timeout_ms(250)),
            Duration::from_millis(250)
        );
        assert_eq!(
            deadline(&config, &plain.timeout_ms(60_000)),
            Duration::from_millis(2_000)
        );
    }

    #[test]
    fn timeout_is_read_from_the_query_string_shape() {
        let request: QueryRequest = serde_json::from_value(serde_json::json!({
            "table": "players",
            "limit": 5,
            "timeout_ms": 100
        }))
        .unwrap_or_else(|e| panic!("request should parse: {e}"));
        assert_eq!(request.page_size, Some(5));
        assert_eq!(request.timeout_ms, Some(100));
    }
}
