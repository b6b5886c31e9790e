// Table implementation
// A table is an ordered list of records; order reflects insertion order

use super::{values_equal, Record};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Field holding a record's identifier
pub const ID_FIELD: &str = "id";
/// Field stamped on insert when the caller did not supply it
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field stamped on every update
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Represents one named table of the mock session
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// The name of the table
    pub name: String,
    /// The records, in insertion order
    rows: Vec<Record>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Create a table holding exactly the given records
    pub fn with_rows(name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Borrow all records in table order
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Get the number of records in the table
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append records, filling in `id` and `created_at` where absent
    /// Returns the stored records in input order
    pub fn insert(&mut self, records: Vec<Record>, id_prefix: &str) -> Vec<Record> {
        let now = now_timestamp();
        let mut inserted = Vec::with_capacity(records.len());

        for record in records {
            let mut row = Record::new();

            // The id goes first so printed rows lead with it
            let id = match record.get(ID_FIELD) {
                Some(id) if !id.is_null() => id.clone(),
                _ => Value::String(self.generate_id(id_prefix)),
            };
            row.insert(ID_FIELD.to_string(), id);

            for (field, value) in record {
                if field == ID_FIELD {
                    continue;
                }
                row.insert(field, value);
            }

            if row.get(CREATED_AT_FIELD).map_or(true, Value::is_null) {
                row.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
            }

            self.rows.push(row.clone());
            inserted.push(row);
        }

        debug!(table = %self.name, count = inserted.len(), "inserted records");
        inserted
    }

    /// Merge `patch` into every record matching `predicate`, stamping `updated_at`
    /// Returns the updated records in table order
    pub fn update_where<F>(&mut self, predicate: F, patch: &Record) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        let now = now_timestamp();
        let mut updated = Vec::new();

        for row in self.rows.iter_mut().filter(|row| predicate(row)) {
            merge_into(row, patch, &now);
            updated.push(row.clone());
        }

        updated
    }

    /// Remove every record matching `predicate`
    /// The remaining records keep their relative order
    pub fn delete_where<F>(&mut self, predicate: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        let (removed, kept): (Vec<Record>, Vec<Record>) =
            std::mem::take(&mut self.rows).into_iter().partition(|row| predicate(row));
        self.rows = kept;
        removed
    }

    /// Insert or merge records keyed on `conflict_field`
    /// A record whose conflict value matches a stored record is merged into the
    /// first such record; any other record, including one whose conflict value
    /// is null or absent, is inserted
    pub fn upsert(&mut self, records: Vec<Record>, conflict_field: &str, id_prefix: &str) -> Vec<Record> {
        let now = now_timestamp();
        let mut written = Vec::with_capacity(records.len());

        for record in records {
            let existing = record
                .get(conflict_field)
                .filter(|key| !key.is_null())
                .and_then(|key| {
                    self.rows.iter().position(|row| {
                        row.get(conflict_field)
                            .map_or(false, |value| values_equal(value, key))
                    })
                });

            match existing {
                Some(position) => {
                    let row = &mut self.rows[position];
                    merge_into(row, &record, &now);
                    written.push(row.clone());
                }
                None => written.extend(self.insert(vec![record], id_prefix)),
            }
        }

        written
    }

    /// Generate an identifier not yet used in this table
    pub fn generate_id(&self, prefix: &str) -> String {
        loop {
            let random = Uuid::new_v4().simple().to_string();
            let candidate = format!(
                "{}-{}-{}",
                prefix,
                Utc::now().timestamp_millis(),
                &random[..12]
            );
            if !self.contains_id(&candidate) {
                return candidate;
            }
        }
    }

    fn contains_id(&self, id: &str) -> bool {
        self.rows
            .iter()
            .any(|row| row.get(ID_FIELD).and_then(Value::as_str) == Some(id))
    }
}

/// Shallow-merge `patch` into `row` and stamp the update time
fn merge_into(row: &mut Record, patch: &Record, now: &str) {
    for (field, value) in patch {
        row.insert(field.clone(), value.clone());
    }
    row.insert(UPDATED_AT_FIELD.to_string(), Value::String(now.to_string()));
}

/// Current UTC time in the ISO-8601 form the backend returns
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
