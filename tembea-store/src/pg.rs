use crate::feed::ChangeFeed;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Postgres, QueryBuilder};
use std::sync::Arc;
use tembea_core::client::{
    ClientError, ClientResult, Filter, Query, RemoteClient, Subscription, SubscriptionSpec,
};
use tembea_shared::Table;

/// Remote client over the hosted Postgres. Queries are built dynamically
/// from the contract's filters; rows travel as `row_to_json` so callers see
/// exactly what the store serialized. Realtime events arrive through the
/// LISTEN/NOTIFY bridge on the shared change feed.
pub struct PgRemoteClient {
    pool: Pool<Postgres>,
    feed: Arc<ChangeFeed>,
    storage_public_base: Option<String>,
}

impl PgRemoteClient {
    pub fn new(pool: Pool<Postgres>, feed: Arc<ChangeFeed>) -> Self {
        Self {
            pool,
            feed,
            storage_public_base: None,
        }
    }

    pub fn with_storage_base(mut self, base: &str) -> Self {
        self.storage_public_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    /// Start relaying the store's NOTIFY stream into the change feed.
    pub fn start_listener(&self) -> tokio::task::JoinHandle<()> {
        self.feed.attach_pg_listener(self.pool.clone())
    }
}

fn build_rows_query(query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT row_to_json(t) FROM ");
    qb.push(query.table.as_str());
    qb.push(" t");

    let mut filters = query.filters.clone();
    if query.table == Table::Listings {
        // Published-only is enforced here for every listing read, on top
        // of the row-level security policy in the migrations. Callers
        // cannot opt out by omitting the filter.
        filters.push(Filter::ilike("status", "published"));
    }
    push_filters(&mut qb, &filters, "t.");

    if let Some(order) = &query.order {
        qb.push(" ORDER BY t.");
        qb.push(order.column.clone());
        qb.push(if order.descending { " DESC" } else { " ASC" });
    }

    qb
}

/// Append `WHERE ...` for the contract's filters. Column names come from
/// application code, never from user input; values are always bound.
fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, filters: &[Filter], prefix: &str) {
    let mut first = true;
    for filter in filters {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;

        match filter {
            Filter::Eq { column, value } => {
                qb.push(prefix);
                qb.push(column.clone());
                qb.push("::text = ");
                qb.push_bind(value_text(value));
            }
            Filter::ILike { column, value } => {
                qb.push(prefix);
                qb.push(column.clone());
                qb.push(" ILIKE ");
                qb.push_bind(value.clone());
            }
            Filter::SearchOr { columns, term } => {
                let pattern = format!("%{}%", escape_like(term));
                qb.push("(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push(prefix);
                    qb.push(column.clone());
                    qb.push(" ILIKE ");
                    qb.push_bind(pattern.clone());
                }
                qb.push(")");
            }
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl RemoteClient for PgRemoteClient {
    async fn select(&self, query: Query) -> ClientResult<Vec<Value>> {
        let mut qb = build_rows_query(&query);
        qb.build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ClientError::QueryFailed(e.to_string()))
    }

    async fn select_one(&self, query: Query) -> ClientResult<Value> {
        let table = query.table;
        let mut rows = self.select(query).await?;
        match rows.len() {
            0 => Err(ClientError::RowNotFound(table)),
            1 => Ok(rows.remove(0)),
            n => Err(ClientError::MultipleRows(table, n)),
        }
    }

    async fn insert(&self, table: Table, record: Value) -> ClientResult<Value> {
        let columns: Vec<String> = match record.as_object() {
            Some(map) => map.keys().cloned().collect(),
            None => {
                return Err(ClientError::MutationFailed(
                    "insert payload must be an object".to_string(),
                ))
            }
        };

        // Column values are decoded through jsonb_populate_record so every
        // column keeps its real type; absent columns keep their defaults.
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO ");
        qb.push(table.as_str());
        qb.push(" (");
        qb.push(columns.join(", "));
        qb.push(") SELECT ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push("r.");
            qb.push(column.clone());
        }
        qb.push(" FROM jsonb_populate_record(NULL::");
        qb.push(table.as_str());
        qb.push(", ");
        qb.push_bind(record);
        qb.push(") r RETURNING row_to_json(");
        qb.push(table.as_str());
        qb.push(")");

        qb.build_query_scalar::<Value>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ClientError::MutationFailed(e.to_string()))
    }

    async fn update(&self, table: Table, patch: Value, filters: Vec<Filter>) -> ClientResult<()> {
        let columns: Vec<String> = match patch.as_object() {
            Some(map) if !map.is_empty() => map.keys().cloned().collect(),
            _ => {
                return Err(ClientError::MutationFailed(
                    "update patch must be a non-empty object".to_string(),
                ))
            }
        };

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ");
        qb.push(table.as_str());
        qb.push(" SET (");
        qb.push(columns.join(", "));
        qb.push(") = (SELECT ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push("r.");
            qb.push(column.clone());
        }
        qb.push(" FROM jsonb_populate_record(NULL::");
        qb.push(table.as_str());
        qb.push(", ");
        qb.push_bind(patch);
        qb.push(") r)");
        push_filters(&mut qb, &filters, "");

        qb.build()
            .execute(&self.pool)
            .await
            .map_err(|e| ClientError::MutationFailed(e.to_string()))?;
        Ok(())
    }

    fn subscribe(&self, spec: SubscriptionSpec) -> Subscription {
        self.feed.subscribe(spec)
    }

    fn unsubscribe(&self, subscription: Subscription) {
        self.feed.unsubscribe(subscription);
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        let base = self.storage_public_base.as_ref()?;
        Some(format!(
            "{}/storage/v1/object/public/{}/{}",
            base, bucket, path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_terms_are_escaped() {
        assert_eq!(escape_like("100%_safari"), "100\\%\\_safari");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn select_sql_carries_guard_and_ordering() {
        use tembea_core::client::Ordering;

        let mut qb = build_rows_query(
            &Query::table(Table::Listings)
                .filter(Filter::ilike("category", "tour"))
                .filter(Filter::search_or(&["title", "description"], "safari"))
                .order_by(Ordering::created_at_desc()),
        );
        let sql = qb.sql().to_string();

        assert!(sql.contains("t.category ILIKE"));
        assert!(sql.contains("t.title ILIKE"));
        assert!(sql.contains("OR t.description ILIKE"));
        assert!(sql.contains("t.status ILIKE"));
        assert!(sql.ends_with("ORDER BY t.created_at DESC"));
    }
}
