use crate::feed::ChangeFeed;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tembea_core::client::{
    ClientError, ClientResult, Filter, Query, RemoteClient, Subscription, SubscriptionSpec,
};
use tembea_shared::{ChangeAction, ChangeEvent, Table};
use uuid::Uuid;

/// In-memory remote client. Implements the same contract and the same
/// published-only guard as the Postgres client, backed by plain vectors of
/// JSON rows and the shared change feed. Used by tests across the workspace.
pub struct MemoryRemoteClient {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    feed: Arc<ChangeFeed>,
    storage_base: Option<String>,
    select_error: Mutex<Option<String>>,
    next_insert_error: Mutex<Option<String>>,
    select_latency: Mutex<Option<Duration>>,
}

impl MemoryRemoteClient {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            feed: Arc::new(ChangeFeed::new()),
            storage_base: None,
            select_error: Mutex::new(None),
            next_insert_error: Mutex::new(None),
            select_latency: Mutex::new(None),
        }
    }

    pub fn with_storage_base(mut self, base: &str) -> Self {
        self.storage_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    pub fn feed(&self) -> Arc<ChangeFeed> {
        Arc::clone(&self.feed)
    }

    /// Seed rows as the store would hold them. Rows without an `id` or
    /// `created_at` get them filled in, like the store's column defaults.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut tables = self.tables.lock().expect("memory store lock poisoned");
        let slot = tables.entry(table).or_default();
        for mut row in rows {
            fill_defaults(&mut row);
            slot.push(row);
        }
    }

    /// While set, every select fails with this message.
    pub fn set_select_error(&self, message: Option<&str>) {
        *self.select_error.lock().expect("memory store lock poisoned") =
            message.map(|m| m.to_string());
    }

    /// The next insert fails once with this message.
    pub fn fail_next_insert(&self, message: &str) {
        *self
            .next_insert_error
            .lock()
            .expect("memory store lock poisoned") = Some(message.to_string());
    }

    /// Delay every select; lets tests overlap an in-flight fetch with a
    /// change notification or a teardown.
    pub fn set_select_latency(&self, latency: Option<Duration>) {
        *self
            .select_latency
            .lock()
            .expect("memory store lock poisoned") = latency;
    }

    /// Simulate an external (admin) deletion, with its change event.
    pub fn remove(&self, table: Table, filters: Vec<Filter>) {
        let removed: Vec<Value> = {
            let mut tables = self.tables.lock().expect("memory store lock poisoned");
            let slot = tables.entry(table).or_default();
            let (gone, kept): (Vec<Value>, Vec<Value>) = slot
                .drain(..)
                .partition(|row| filters.iter().all(|f| f.matches(row)));
            *slot = kept;
            gone
        };
        for row in removed {
            self.feed
                .publish(&ChangeEvent::new(table, ChangeAction::Delete, row));
        }
    }

    /// Simulate an external (admin) update, with its change event. Unlike
    /// `update`, this bypasses the client contract's own mutation path.
    pub fn mutate_externally(&self, table: Table, patch: Value, filters: Vec<Filter>) {
        let changed = apply_patch(
            &mut self.tables.lock().expect("memory store lock poisoned"),
            table,
            &patch,
            &filters,
        );
        for row in changed {
            self.feed
                .publish(&ChangeEvent::new(table, ChangeAction::Update, row));
        }
    }

    fn matching_rows(&self, query: &Query) -> Vec<Value> {
        let tables = self.tables.lock().expect("memory store lock poisoned");
        let rows = tables.get(&query.table).cloned().unwrap_or_default();

        let mut filters = query.filters.clone();
        if query.table == Table::Listings {
            // The store's access-control layer enforces published-only for
            // listing reads regardless of what the caller asked for.
            filters.push(Filter::ilike("status", "published"));
        }

        let mut matched: Vec<Value> = rows
            .into_iter()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(order) = &query.order {
            matched.sort_by(|a, b| {
                let ka = sort_key(a, &order.column);
                let kb = sort_key(b, &order.column);
                if order.descending {
                    kb.cmp(&ka)
                } else {
                    ka.cmp(&kb)
                }
            });
        }

        matched
    }

    async fn before_select(&self) -> ClientResult<()> {
        let latency = *self
            .select_latency
            .lock()
            .expect("memory store lock poisoned");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let error = self
            .select_error
            .lock()
            .expect("memory store lock poisoned")
            .clone();
        match error {
            Some(message) => Err(ClientError::QueryFailed(message)),
            None => Ok(()),
        }
    }
}

impl Default for MemoryRemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_defaults(row: &mut Value) {
    if let Some(map) = row.as_object_mut() {
        if !map.contains_key("id") {
            map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !map.contains_key("created_at") {
            map.insert(
                "created_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
    }
}

fn sort_key(row: &Value, column: &str) -> String {
    let cell = row.get(column);
    if let Some(text) = cell.and_then(Value::as_str) {
        if let Ok(ts) = text.parse::<DateTime<Utc>>() {
            return ts.to_rfc3339();
        }
        return text.to_string();
    }
    cell.map(|v| v.to_string()).unwrap_or_default()
}

fn apply_patch(
    tables: &mut HashMap<Table, Vec<Value>>,
    table: Table,
    patch: &Value,
    filters: &[Filter],
) -> Vec<Value> {
    let mut changed = Vec::new();
    let Some(rows) = tables.get_mut(&table) else {
        return changed;
    };
    for row in rows.iter_mut() {
        if filters.iter().all(|f| f.matches(row)) {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            changed.push(row.clone());
        }
    }
    changed
}

#[async_trait]
impl RemoteClient for MemoryRemoteClient {
    async fn select(&self, query: Query) -> ClientResult<Vec<Value>> {
        self.before_select().await?;
        Ok(self.matching_rows(&query))
    }

    async fn select_one(&self, query: Query) -> ClientResult<Value> {
        self.before_select().await?;
        let mut rows = self.matching_rows(&query);
        match rows.len() {
            0 => Err(ClientError::RowNotFound(query.table)),
            1 => Ok(rows.remove(0)),
            n => Err(ClientError::MultipleRows(query.table, n)),
        }
    }

    async fn insert(&self, table: Table, record: Value) -> ClientResult<Value> {
        let error = self
            .next_insert_error
            .lock()
            .expect("memory store lock poisoned")
            .take();
        if let Some(message) = error {
            return Err(ClientError::MutationFailed(message));
        }

        let mut row = record;
        fill_defaults(&mut row);
        self.tables
            .lock()
            .expect("memory store lock poisoned")
            .entry(table)
            .or_default()
            .push(row.clone());

        self.feed
            .publish(&ChangeEvent::new(table, ChangeAction::Insert, row.clone()));
        Ok(row)
    }

    async fn update(&self, table: Table, patch: Value, filters: Vec<Filter>) -> ClientResult<()> {
        let changed = apply_patch(
            &mut self.tables.lock().expect("memory store lock poisoned"),
            table,
            &patch,
            &filters,
        );
        for row in changed {
            self.feed
                .publish(&ChangeEvent::new(table, ChangeAction::Update, row));
        }
        Ok(())
    }

    fn subscribe(&self, spec: SubscriptionSpec) -> Subscription {
        self.feed.subscribe(spec)
    }

    fn unsubscribe(&self, subscription: Subscription) {
        self.feed.unsubscribe(subscription);
    }

    fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        let base = self.storage_base.as_ref()?;
        Some(format!(
            "{}/storage/v1/object/public/{}/{}",
            base, bucket, path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tembea_core::client::Ordering;

    fn seeded() -> MemoryRemoteClient {
        let client = MemoryRemoteClient::new();
        client.seed(
            Table::Listings,
            vec![
                json!({"id": "a", "title": "Serengeti Safari", "description": "plains",
                       "category": "tour", "status": "published",
                       "created_at": "2026-01-01T00:00:00Z"}),
                json!({"id": "b", "title": "Hidden Draft", "description": "not yet",
                       "category": "tour", "status": "draft",
                       "created_at": "2026-01-02T00:00:00Z"}),
                json!({"id": "c", "title": "Zanzibar Stay", "description": "beach",
                       "category": "stay", "status": "PUBLISHED",
                       "created_at": "2026-01-03T00:00:00Z"}),
            ],
        );
        client
    }

    #[tokio::test]
    async fn unpublished_rows_never_surface_even_unfiltered() {
        let client = seeded();
        let rows = client.select(Query::table(Table::Listings)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["id"] != "b"));
    }

    #[tokio::test]
    async fn ordering_is_newest_first() {
        let client = seeded();
        let rows = client
            .select(Query::table(Table::Listings).order_by(Ordering::created_at_desc()))
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], "c");
        assert_eq!(rows[1]["id"], "a");
    }

    #[tokio::test]
    async fn select_one_requires_exactly_one_row() {
        let client = seeded();

        let missing = client
            .select_one(Query::table(Table::Listings).filter(Filter::eq("id", "nope")))
            .await;
        assert!(matches!(missing, Err(ClientError::RowNotFound(_))));

        let ambiguous = client
            .select_one(Query::table(Table::Listings))
            .await;
        assert!(matches!(ambiguous, Err(ClientError::MultipleRows(_, 2))));

        let one = client
            .select_one(Query::table(Table::Listings).filter(Filter::eq("id", "a")))
            .await
            .unwrap();
        assert_eq!(one["title"], "Serengeti Safari");
    }

    #[tokio::test]
    async fn insert_fills_defaults_and_publishes() {
        let client = MemoryRemoteClient::new();
        let mut stream = client
            .subscribe(SubscriptionSpec::table(Table::Bookings).scope("all"))
            .receiver;

        let row = client
            .insert(Table::Bookings, json!({"user_id": "u1", "guests": 2}))
            .await
            .unwrap();
        assert!(row.get("id").is_some());
        assert!(row.get("created_at").is_some());

        let event = stream.recv().await.unwrap();
        assert_eq!(event.action, ChangeAction::Insert);
        assert_eq!(event.row["user_id"], "u1");
    }

    #[tokio::test]
    async fn update_patches_matching_rows_and_publishes() {
        let client = seeded();
        let mut stream = client
            .subscribe(SubscriptionSpec::table(Table::Listings).scope("all:all"))
            .receiver;

        client
            .update(
                Table::Listings,
                json!({"title": "Serengeti Grand Safari"}),
                vec![Filter::eq("id", "a")],
            )
            .await
            .unwrap();

        let rows = client
            .select(Query::table(Table::Listings).filter(Filter::eq("id", "a")))
            .await
            .unwrap();
        assert_eq!(rows[0]["title"], "Serengeti Grand Safari");
        assert_eq!(stream.recv().await.unwrap().action, ChangeAction::Update);
    }

    #[tokio::test]
    async fn injected_select_error_is_stable_until_cleared() {
        let client = seeded();
        client.set_select_error(Some("connection reset"));

        let err = client.select(Query::table(Table::Listings)).await;
        assert!(matches!(err, Err(ClientError::QueryFailed(m)) if m == "connection reset"));

        client.set_select_error(None);
        assert!(client.select(Query::table(Table::Listings)).await.is_ok());
    }
}
