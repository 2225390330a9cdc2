//! Column filters and free-text search over fetched records.
//!
//! Both are case-insensitive substring matches. Neither touches the
//! persisted order; they only decide which records are shown.

use server_inventory_types::{COLUMNS, ServerRecord};
use std::collections::BTreeMap;

/// Per-column filter text keyed by wire name. An empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilters {
    by_key: BTreeMap<String, String>,
}

impl ColumnFilters {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.by_key.remove(key);
        } else {
            self.by_key.insert(key.to_string(), value);
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.by_key.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.by_key.is_empty()
    }

    /// True when every column's filter is a substring of that column's value.
    pub fn matches(&self, record: &ServerRecord) -> bool {
        COLUMNS.iter().all(|c| {
            let needle = self.get(c.key);
            needle.is_empty()
                || record
                    .field(c.key)
                    .is_some_and(|value| contains_ignore_case(value, needle))
        })
    }
}

/// True when any field, the identifier included, contains `query`.
pub fn matches_query(record: &ServerRecord, query: &str) -> bool {
    if record
        .id
        .is_some_and(|id| contains_ignore_case(&id.to_string(), query))
    {
        return true;
    }
    record.values().any(|value| contains_ignore_case(value, query))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
