use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque-ish cursor over the `(created_at, id)` ordering the Persistence
/// Store uses for every result page (§4.1). Serializes to a single string
/// at API boundaries; repositories decompose it back into its two fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn encode(&self) -> String {
        format!("{}:{}", self.created_at.timestamp_micros(), self.id)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (ts, id) = raw.split_once(':')?;
        let micros: i64 = ts.parse().ok()?;
        let created_at = DateTime::from_timestamp_micros(micros)?;
        let id = Uuid::parse_str(id).ok()?;
        Some(Cursor { created_at, id })
    }
}

/// A page of results plus the cursor to request the next one, or `None`
/// when the caller has reached the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Page { items, next_cursor }
    }
}
