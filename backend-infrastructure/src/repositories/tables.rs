use std::collections::BTreeMap;

use serde_json::Value;

use backend_domain::{Collection, Filter, Row, StoreError};

/// Row tables with unique-key enforcement, shared by the store adapters.
/// Each method applies one store operation atomically to `self`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    rows: BTreeMap<Collection, Vec<Row>>,
}

impl Tables {
    pub fn from_rows(rows: BTreeMap<Collection, Vec<Row>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &BTreeMap<Collection, Vec<Row>> {
        &self.rows
    }

    pub fn insert(&mut self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        let table = self.rows.entry(collection).or_default();
        if let Some(key) = conflicting_key(collection, table, &row, None) {
            return Err(StoreError::UniqueViolation { collection, key });
        }
        table.push(row.clone());
        Ok(row)
    }

    pub fn select_one(&self, collection: Collection, filter: &Filter) -> Option<Row> {
        self.rows
            .get(&collection)
            .and_then(|table| table.iter().find(|row| filter.matches(row)))
            .cloned()
    }

    pub fn select_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Vec<Row> {
        let Some(table) = self.rows.get(&collection) else {
            return Vec::new();
        };
        table
            .iter()
            .filter(|row| filter.matches(row))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn update(
        &mut self,
        collection: Collection,
        filter: &Filter,
        patch: Row,
    ) -> Result<Option<Row>, StoreError> {
        let Some(table) = self.rows.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(index) = table.iter().position(|row| filter.matches(row)) else {
            return Ok(None);
        };
        let mut merged = table[index].clone();
        for (field, value) in patch {
            merged.insert(field, value);
        }
        if let Some(key) = conflicting_key(collection, table, &merged, Some(index)) {
            return Err(StoreError::UniqueViolation { collection, key });
        }
        table[index] = merged.clone();
        Ok(Some(merged))
    }

    pub fn delete(&mut self, collection: Collection, filter: &Filter) -> usize {
        let Some(table) = self.rows.get_mut(&collection) else {
            return 0;
        };
        let before = table.len();
        table.retain(|row| !filter.matches(row));
        before - table.len()
    }
}

fn conflicting_key(
    collection: Collection,
    table: &[Row],
    candidate: &Row,
    skip: Option<usize>,
) -> Option<String> {
    for fields in collection.unique_keys() {
        let Some(candidate_key) = key_values(candidate, fields) else {
            continue;
        };
        let clash = table
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != skip)
            .any(|(_, row)| key_values(row, fields).as_ref() == Some(&candidate_key));
        if clash {
            return Some(fields.join(", "));
        }
    }
    None
}

fn key_values<'a>(row: &'a Row, fields: &[&str]) -> Option<Vec<&'a Value>> {
    fields
        .iter()
        .map(|field| row.get(*field).filter(|value| !value.is_null()))
        .collect()
}
