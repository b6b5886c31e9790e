// Query Executor
// Evaluates query descriptors against a RecordStore and performs writes

use super::builder::{Columns, Query};
use super::filter::matches_all;
use super::parser::Statement;
use crate::config::{MockConfig, SingleRowPolicy};
use crate::response::Response;
use crate::storage::{sort_order, store::RecordStore, table::ID_FIELD, Record};
use tracing::{debug, warn};

/// Executes queries with a fixed set of behaviour knobs
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    single_row_policy: SingleRowPolicy,
    enforce_projection: bool,
    id_prefix: String,
}

impl QueryExecutor {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            single_row_policy: config.single_row_policy,
            enforce_projection: config.enforce_projection,
            id_prefix: config.id_prefix.clone(),
        }
    }

    /// Evaluate a read: filter, then stable sort, then limit
    /// Works on a snapshot; the store is never modified. Reads never fail
    pub fn select(&self, store: &RecordStore, query: &Query) -> Response<Vec<Record>> {
        Response::ok(self.evaluate(store, query))
    }

    /// Evaluate a read and return the first row, or None when nothing matches
    pub fn single(&self, store: &RecordStore, query: &Query) -> Response<Option<Record>> {
        let rows = self.evaluate(store, query);

        if rows.len() > 1 && self.single_row_policy == SingleRowPolicy::Strict {
            warn!(table = %query.table, rows = rows.len(), "single-row query matched multiple rows");
            return Response::failed(format!(
                "JSON object requested, multiple ({}) rows returned",
                rows.len()
            ));
        }

        Response::ok(rows.into_iter().next())
    }

    /// Append records to a table, assigning `id` and `created_at` where absent
    pub fn insert(&self, store: &mut RecordStore, table: &str, records: Vec<Record>) -> Response<Vec<Record>> {
        Response::ok(store.table_mut(table).insert(records, &self.id_prefix))
    }

    /// Merge `patch` into every live record matching the query's filters
    /// Sort, limit and projection of the query are ignored
    pub fn update(&self, store: &mut RecordStore, query: &Query, patch: &Record) -> Response<Vec<Record>> {
        if query.filters.is_empty() {
            warn!(table = %query.table, "update without filters touches every record");
        }

        let updated = store
            .table_mut(&query.table)
            .update_where(|row| matches_all(&query.filters, row), patch);
        debug!(table = %query.table, count = updated.len(), "updated records");
        Response::ok(updated)
    }

    /// Remove every live record matching the query's filters
    pub fn delete(&self, store: &mut RecordStore, query: &Query) -> Response<Vec<Record>> {
        if query.filters.is_empty() {
            warn!(table = %query.table, "delete without filters empties the table");
        }

        let removed = store
            .table_mut(&query.table)
            .delete_where(|row| matches_all(&query.filters, row));
        debug!(table = %query.table, count = removed.len(), "deleted records");
        Response::ok(removed)
    }

    /// Insert records, merging those whose `on_conflict` field (default `id`)
    /// matches a stored record
    pub fn upsert(
        &self,
        store: &mut RecordStore,
        table: &str,
        records: Vec<Record>,
        on_conflict: Option<&str>,
    ) -> Response<Vec<Record>> {
        let conflict_field = on_conflict.unwrap_or(ID_FIELD);
        Response::ok(
            store
                .table_mut(table)
                .upsert(records, conflict_field, &self.id_prefix),
        )
    }

    /// Run a parsed console statement
    pub fn execute(&self, store: &mut RecordStore, statement: Statement) -> Response<Vec<Record>> {
        match statement {
            Statement::Select(query) => self.select(store, &query),
            Statement::Insert { table, records } => self.insert(store, &table, records),
            Statement::Update { query, patch } => self.update(store, &query, &patch),
            Statement::Delete(query) => self.delete(store, &query),
        }
    }

    fn evaluate(&self, store: &RecordStore, query: &Query) -> Vec<Record> {
        let snapshot = store.rows(&query.table);

        let mut rows: Vec<Record> = snapshot
            .iter()
            .filter(|row| matches_all(&query.filters, row))
            .cloned()
            .collect();

        // sort_by is stable, and reversing the comparator (not the output)
        // keeps ties in their prior order for descending sorts too
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = sort_order(a.get(&order.field), b.get(&order.field));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if self.enforce_projection {
            if let Columns::Named(columns) = &query.columns {
                rows = rows.iter().map(|row| project(row, columns)).collect();
            }
        }

        debug!(
            table = %query.table,
            scanned = snapshot.len(),
            returned = rows.len(),
            "evaluated query"
        );
        rows
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(&MockConfig::default())
    }
}

/// Keep only the named fields, in the order they were named
fn project(row: &Record, columns: &[String]) -> Record {
    columns
        .iter()
        .filter_map(|column| row.get(column).map(|value| (column.clone(), value.clone())))
        .collect()
}
