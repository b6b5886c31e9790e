// Record store
// Owns every table of a mock session plus the current session identity

use super::{table::Table, Record};
use std::collections::HashMap;
use tracing::info;

/// All tables of one mock session
/// Tables spring into existence the first time something writes to them
#[derive(Debug, Clone)]
pub struct RecordStore {
    tables: HashMap<String, Table>,
    /// Tables recreated (empty) on every reset
    default_tables: Vec<String>,
    /// The signed-in user, if any
    current_user: Option<Record>,
}

impl RecordStore {
    /// Create a store with the given empty default tables
    pub fn new(default_tables: Vec<String>) -> Self {
        let mut store = Self {
            tables: HashMap::new(),
            default_tables,
            current_user: None,
        };
        store.reset();
        store
    }

    /// Drop all data and the session, leaving only the empty default tables
    pub fn reset(&mut self) {
        self.tables = self
            .default_tables
            .iter()
            .map(|name| (name.clone(), Table::new(name.clone())))
            .collect();
        self.current_user = None;
        info!("mock data reset");
    }

    /// Replace a table's contents wholesale
    pub fn seed(&mut self, table_name: &str, records: Vec<Record>) {
        info!(table = table_name, count = records.len(), "seeded table");
        self.tables
            .insert(table_name.to_string(), Table::with_rows(table_name, records));
    }

    /// Look up a table for reading
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Look up a table for writing, creating it if needed
    pub fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name))
    }

    /// Records of a table in stored order; unknown tables are empty
    pub fn rows(&self, name: &str) -> &[Record] {
        self.table(name).map(Table::rows).unwrap_or(&[])
    }

    /// Number of records in a table (0 for unknown tables)
    pub fn row_count(&self, name: &str) -> usize {
        self.table(name).map_or(0, Table::row_count)
    }

    /// List all table names, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn current_user(&self) -> Option<&Record> {
        self.current_user.as_ref()
    }

    pub fn set_current_user(&mut self, user: Option<Record>) {
        self.current_user = user;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Vec<String> {
        vec!["users".to_string(), "workouts".to_string()]
    }

    #[test]
    fn test_new_store_has_empty_default_tables() {
        let store = RecordStore::new(defaults());
        assert_eq!(store.table_names(), vec!["users", "workouts"]);
        assert_eq!(store.row_count("users"), 0);
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_unknown_table_reads_empty() {
        let store = RecordStore::new(defaults());
        assert!(store.rows("nope").is_empty());
        assert_eq!(store.row_count("nope"), 0);
    }

    #[test]
    fn test_seed_replaces_contents() {
        let mut store = RecordStore::new(defaults());
        let first = json!({"id": 1}).as_object().unwrap().clone();
        let second = json!({"id": 2}).as_object().unwrap().clone();

        store.seed("workouts", vec![first.clone()]);
        store.seed("workouts", vec![second.clone(), first.clone()]);

        assert_eq!(store.rows("workouts"), &[second, first]);
    }

    #[test]
    fn test_reset_clears_tables_and_session() {
        let mut store = RecordStore::new(defaults());
        let user = json!({"id": "u1"}).as_object().unwrap().clone();
        store.seed("exercises", vec![user.clone()]);
        store.set_current_user(Some(user));

        store.reset();

        assert!(store.current_user().is_none());
        assert!(store.table("exercises").is_none());
        assert_eq!(store.table_names(), vec!["users", "workouts"]);
    }
}
