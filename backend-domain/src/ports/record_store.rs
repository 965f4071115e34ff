use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Events,
    Joins,
    PointsLedger,
    Groups,
    GroupMembers,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Events,
        Collection::Joins,
        Collection::PointsLedger,
        Collection::Groups,
        Collection::GroupMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Events => "events",
            Collection::Joins => "joins",
            Collection::PointsLedger => "points_ledger",
            Collection::Groups => "groups",
            Collection::GroupMembers => "group_members",
        }
    }

    /// Field sets that must be unique across rows. Rows with a null in any
    /// field of a key are exempt from that key.
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::Events => &[&["id"]],
            Collection::Joins => &[&["id"], &["user_id", "event_id"]],
            Collection::PointsLedger => &[&["id"], &["dedupe_key"]],
            Collection::Groups => &[&["id"], &["invite_code"]],
            Collection::GroupMembers => &[&["group_id", "user_id"]],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    IsNull(String),
    NotNull(String),
}

impl Condition {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::Eq(field, expected) => row.get(field) == Some(expected),
            Condition::IsNull(field) => row.get(field).map_or(true, Value::is_null),
            Condition::NotNull(field) => row.get(field).map_or(false, |value| !value.is_null()),
        }
    }
}

/// Conjunction of conditions; the empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn is_null(mut self, field: &str) -> Self {
        self.conditions.push(Condition::IsNull(field.to_string()));
        self
    }

    pub fn not_null(mut self, field: &str) -> Self {
        self.conditions.push(Condition::NotNull(field.to_string()));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| condition.matches(row))
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("unique key ({key}) violated in {collection}")]
    UniqueViolation { collection: Collection, key: String },
    #[error("record store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed row in {collection}: {message}")]
    Malformed {
        collection: Collection,
        message: String,
    },
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Generic row store. Every mutating call is atomic with respect to the
/// filter it evaluates, which is what makes conditional updates usable as
/// compare-and-set.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError>;

    async fn select_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Row>, StoreError>;

    async fn select_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Patches the first row matching `filter`; `None` when nothing matched.
    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Row,
    ) -> Result<Option<Row>, StoreError>;

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub fn to_row<T: Serialize>(collection: Collection, value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(StoreError::Malformed {
            collection,
            message: format!("expected an object, got {other}"),
        }),
        Err(err) => Err(StoreError::Malformed {
            collection,
            message: err.to_string(),
        }),
    }
}

pub fn from_row<T: DeserializeOwned>(collection: Collection, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|err| StoreError::Malformed {
        collection,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn filter_conditions_are_conjunctive() {
        let joined = row(json!({"user_id": "u1", "event_id": "e1", "checked_in_at": null}));
        let filter = Filter::new()
            .eq("user_id", "u1")
            .eq("event_id", "e1")
            .is_null("checked_in_at");
        assert!(filter.matches(&joined));
        assert!(!Filter::new().eq("user_id", "u2").matches(&joined));
        assert!(!Filter::new().not_null("checked_in_at").matches(&joined));
    }

    #[test]
    fn missing_fields_count_as_null() {
        let sparse = row(json!({"user_id": "u1"}));
        assert!(Filter::new().is_null("checked_out_at").matches(&sparse));
        assert!(!Filter::new().not_null("checked_out_at").matches(&sparse));
        assert!(Filter::new().matches(&sparse));
    }

    #[test]
    fn non_object_values_are_malformed_rows() {
        let err = to_row(Collection::Events, &5).expect_err("not an object");
        assert!(matches!(err, StoreError::Malformed { collection: Collection::Events, .. }));
    }
}
