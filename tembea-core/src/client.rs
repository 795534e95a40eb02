use async_trait::async_trait;
use serde_json::Value;
use tembea_shared::{ChangeAction, ChangeEvent, Table};
use tokio::sync::broadcast;

/// Errors surfaced by the remote data client. Every failure is terminal for
/// the operation that produced it; callers re-trigger explicitly, never retry.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Mutation failed: {0}")]
    MutationFailed(String),

    #[error("No matching row in {0}")]
    RowNotFound(Table),

    #[error("Expected exactly one row in {0}, found {1}")]
    MultipleRows(Table, usize),

    #[error("Malformed row: {0}")]
    Decode(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Row predicates the store understands.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub enum Filter {
    /// Exact equality on a key column (ids, foreign keys).
    Eq { column: String, value: Value },
    /// Case-insensitive equality (`ilike` with no wildcards).
    ILike { column: String, value: String },
    /// Case-insensitive substring match OR'd across text columns.
    SearchOr { columns: Vec<String>, term: String },
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn ilike(column: &str, value: &str) -> Self {
        Filter::ILike {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn search_or(columns: &[&str], term: &str) -> Self {
        Filter::SearchOr {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            term: term.to_string(),
        }
    }

    /// Evaluate the predicate against a JSON row. Shared by the in-memory
    /// client and by subscription row filters, so both stores agree on
    /// matching semantics.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq { column, value } => match row.get(column) {
                Some(cell) => cell == value || as_text(cell) == as_text(value),
                None => false,
            },
            Filter::ILike { column, value } => match row.get(column).and_then(Value::as_str) {
                Some(cell) => cell.eq_ignore_ascii_case(value),
                None => false,
            },
            Filter::SearchOr { columns, term } => {
                let needle = term.to_lowercase();
                columns.iter().any(|column| {
                    row.get(column)
                        .and_then(Value::as_str)
                        .map(|cell| cell.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
        }
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result ordering. Every list in this system orders by `created_at`
/// descending, but the contract keeps the column explicit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub descending: bool,
}

impl Ordering {
    pub fn created_at_desc() -> Self {
        Self {
            column: "created_at".to_string(),
            descending: true,
        }
    }
}

/// A read against one table.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Ordering>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: Ordering) -> Self {
        self.order = Some(order);
        self
    }
}

/// Which change kinds a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMask {
    All,
    Only(ChangeAction),
}

impl EventMask {
    pub fn accepts(&self, action: ChangeAction) -> bool {
        match self {
            EventMask::All => true,
            EventMask::Only(only) => *only == action,
        }
    }
}

/// One change-notification stream request. The channel name is derived from
/// the table plus the scope string, so equally-scoped subscribers share a
/// registry entry.
#[derive(Debug, Clone)]
pub struct SubscriptionSpec {
    pub table: Table,
    pub events: EventMask,
    pub row_filter: Option<Filter>,
    scope: String,
}

impl SubscriptionSpec {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            events: EventMask::All,
            row_filter: None,
            scope: "all".to_string(),
        }
    }

    pub fn events(mut self, events: EventMask) -> Self {
        self.events = events;
        self
    }

    /// Restrict delivery to rows where `column` equals `value`, and fold the
    /// restriction into the channel name.
    pub fn row_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.scope = format!("{}={}", column, as_text(&value));
        self.row_filter = Some(Filter::Eq {
            column: column.to_string(),
            value,
        });
        self
    }

    /// Replace the scope suffix used in the channel name (list views encode
    /// their category/search parameters here).
    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn channel(&self) -> String {
        format!("public:{}:{}", self.table, self.scope)
    }

    /// Should this event be delivered to subscribers of this spec?
    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table || !self.events.accepts(event.action) {
            return false;
        }
        match &self.row_filter {
            Some(filter) => filter.matches(&event.row),
            None => true,
        }
    }
}

/// An open change-notification stream. Owned by exactly one view instance;
/// must be passed back to `unsubscribe` when the owner tears down.
pub struct Subscription {
    pub channel: String,
    pub receiver: broadcast::Receiver<ChangeEvent>,
}

/// The external backend-as-a-service boundary: queried storage, mutations,
/// realtime change notifications, and object-storage URL resolution. Auth
/// lives with the same hosted service but is modeled separately
/// (`crate::identity`).
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch all rows matching the query.
    async fn select(&self, query: Query) -> ClientResult<Vec<Value>>;

    /// Fetch exactly one row; zero or multiple matches is an error.
    async fn select_one(&self, query: Query) -> ClientResult<Value>;

    /// Insert one record and return the stored row.
    async fn insert(&self, table: Table, record: Value) -> ClientResult<Value>;

    /// Apply a patch to all rows matching the filters.
    async fn update(&self, table: Table, patch: Value, filters: Vec<Filter>) -> ClientResult<()>;

    /// Open a change-notification stream.
    fn subscribe(&self, spec: SubscriptionSpec) -> Subscription;

    /// Close a stream opened by `subscribe`.
    fn unsubscribe(&self, subscription: Subscription);

    /// Resolve a storage object to a public URL, if the store can.
    fn public_url(&self, bucket: &str, path: &str) -> Option<String>;
}
