//! Dynamic merchant listing queries.
//!
//! The list and export endpoints accept any combination of optional filters.
//! Each present filter appends one parameterized `AND` clause; user input is
//! only ever bound, never interpolated into the SQL text.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::merchant::MerchantFilter;

const SUMMARY_SELECT: &str = r#"
    SELECT m.id, m.dba_trading_name, m.registered_name, m.merchant_type, m.employees_num,
           m.currency_code,
           m.category_code, m.registration_status, m.registration_status_reason,
           m.dfsp_id, d.name AS dfsp_name,
           m.created_by_id, creator.name AS created_by_name,
           m.checked_by_id, checker.name AS checked_by_name,
           (SELECT c.alias_value FROM checkout_counters c
             WHERE c.merchant_id = m.id
             ORDER BY c.created_at
             LIMIT 1) AS payinto_alias,
           m.created_at, m.updated_at
    FROM merchants m
    JOIN dfsps d ON d.id = m.dfsp_id
    JOIN portal_users creator ON creator.id = m.created_by_id
    LEFT JOIN portal_users checker ON checker.id = m.checked_by_id
    WHERE 1 = 1"#;

const COUNT_SELECT: &str = "SELECT COUNT(*) FROM merchants m WHERE 1 = 1";

/// Resolved page window for a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Clamp the requested page and limit: pages start at 1 and the limit
    /// falls back to `default_limit` and never exceeds `max_limit`.
    pub fn resolve(filter: &MerchantFilter, default_limit: i64, max_limit: i64) -> Self {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter
            .limit
            .unwrap_or(default_limit)
            .clamp(1, max_limit.max(1));
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total_count: i64) -> i64 {
        if total_count <= 0 {
            0
        } else {
            (total_count + self.limit - 1) / self.limit
        }
    }
}

/// Escape `%`, `_` and `\` so a search term matches literally inside `ILIKE`.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Append the `AND ...` clauses for every present filter.
///
/// `dfsp_scope` restricts results to one DFSP (DFSP users); `None` means all.
pub fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &MerchantFilter,
    dfsp_scope: Option<Uuid>,
) {
    if let Some(dfsp_id) = dfsp_scope {
        qb.push(" AND m.dfsp_id = ").push_bind(dfsp_id);
    }
    if let Some(user_id) = filter.added_by {
        qb.push(" AND m.created_by_id = ").push_bind(user_id);
    }
    // Rejecting and reverting also record the checker; only approvals count here.
    if let Some(user_id) = filter.approved_by {
        qb.push(" AND m.checked_by_id = ")
            .push_bind(user_id)
            .push(" AND m.registration_status IN ('WaitingAliasGeneration', 'Approved')");
    }
    if let Some(day) = filter.added_time {
        qb.push(" AND (m.created_at AT TIME ZONE 'UTC')::date = ")
            .push_bind(day);
    }
    if let Some(day) = filter.updated_time {
        qb.push(" AND (m.updated_at AT TIME ZONE 'UTC')::date = ")
            .push_bind(day);
    }
    if let Some(name) = filter
        .dba_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        qb.push(" AND m.dba_trading_name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }
    if let Some(merchant_id) = filter.merchant_id {
        qb.push(" AND m.id = ").push_bind(merchant_id);
    }
    if let Some(status) = filter.registration_status {
        qb.push(" AND m.registration_status = ").push_bind(status);
    }
}

/// Page of merchant summaries, newest first.
pub fn list_query(
    filter: &MerchantFilter,
    dfsp_scope: Option<Uuid>,
    pagination: Pagination,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SUMMARY_SELECT);
    push_filters(&mut qb, filter, dfsp_scope);
    qb.push(" ORDER BY m.created_at DESC, m.id")
        .push(" LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    qb
}

/// Number of merchants matching the filters.
pub fn count_query(filter: &MerchantFilter, dfsp_scope: Option<Uuid>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(COUNT_SELECT);
    push_filters(&mut qb, filter, dfsp_scope);
    qb
}

/// Every matching merchant (up to `max_rows`), for export.
pub fn export_query(
    filter: &MerchantFilter,
    dfsp_scope: Option<Uuid>,
    max_rows: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SUMMARY_SELECT);
    push_filters(&mut qb, filter, dfsp_scope);
    qb.push(" ORDER BY m.created_at DESC, m.id LIMIT ")
        .push_bind(max_rows);
    qb
}
