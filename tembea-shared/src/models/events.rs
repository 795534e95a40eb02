use crate::models::Table;

/// Row-level change kinds delivered by the store's realtime feed.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// A change notification for one row of a watched table.
///
/// `row` carries the row as the store serialized it (the new row for
/// inserts/updates, the old row for deletes). Deliveries are fire-and-forget;
/// consumers are expected to refetch, not to merge this payload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: ChangeAction,
    pub row: serde_json::Value,
    pub occurred_at: i64,
}

impl ChangeEvent {
    pub fn new(table: Table, action: ChangeAction, row: serde_json::Value) -> Self {
        Self {
            table,
            action,
            row,
            occurred_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Value of a column in the event's row payload, if present.
    pub fn column(&self, name: &str) -> Option<&serde_json::Value> {
        self.row.get(name)
    }
}
