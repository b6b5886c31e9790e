// Mock client
// The surface code under test talks to: from(table) for queries, auth() for
// sessions, storage() for files, plus the hooks tests use to control data

use crate::auth::AuthApi;
use crate::bucket::StorageApi;
use crate::config::MockConfig;
use crate::error::{MockError, MockResult};
use crate::query::{FilterOp, QueryBuilder, QueryExecutor};
use crate::realtime::Channel;
use crate::response::Response;
use crate::storage::{store::RecordStore, Record};
use serde_json::Value;
use tracing::warn;

/// Anything that can be written as one or more records
pub trait IntoRecords {
    fn into_records(self) -> Vec<Record>;
}

impl IntoRecords for Record {
    fn into_records(self) -> Vec<Record> {
        vec![self]
    }
}

impl IntoRecords for Vec<Record> {
    fn into_records(self) -> Vec<Record> {
        self
    }
}

/// A JSON object or an array of objects; anything else is skipped
impl IntoRecords for Value {
    fn into_records(self) -> Vec<Record> {
        match self {
            Value::Object(record) => vec![record],
            Value::Array(values) => values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(record) => Some(record),
                    other => {
                        warn!(value = %other, "skipping non-object record");
                        None
                    }
                })
                .collect(),
            other => {
                warn!(value = %other, "skipping non-object record");
                Vec::new()
            }
        }
    }
}

/// In-memory stand-in for the hosted backend client
#[derive(Debug, Clone)]
pub struct MockClient {
    store: RecordStore,
    executor: QueryExecutor,
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_config(&MockConfig::default())
    }

    pub fn with_config(config: &MockConfig) -> Self {
        Self {
            store: RecordStore::new(config.default_tables.clone()),
            executor: QueryExecutor::new(config),
        }
    }

    /// Start a query chain against `table`
    pub fn from(&mut self, table: &str) -> TableHandle<'_> {
        TableHandle {
            store: &mut self.store,
            executor: &self.executor,
            builder: QueryBuilder::new(table),
        }
    }

    pub fn auth(&mut self) -> AuthApi<'_> {
        AuthApi::new(&mut self.store)
    }

    pub fn storage(&self) -> StorageApi {
        StorageApi
    }

    /// Open a realtime channel; it never delivers events
    pub fn channel(&self, name: &str) -> Channel {
        Channel::new(name)
    }

    /// Empty every table and clear the session
    pub fn reset_mock_data(&mut self) {
        self.store.reset();
    }

    /// Replace a table's contents
    pub fn set_mock_data(&mut self, table: &str, records: impl IntoRecords) {
        self.store.seed(table, records.into_records());
    }

    /// Seed several tables from a JSON object of `table -> [records]`
    pub fn load_fixtures(&mut self, fixtures: Value) -> MockResult<()> {
        let tables = match fixtures {
            Value::Object(tables) => tables,
            _ => return Err(MockError::Seed("expected an object of table name -> records".to_string())),
        };

        for (table, records) in tables {
            if !records.is_array() {
                return Err(MockError::Seed(format!("table '{}' must map to an array", table)));
            }
            self.set_mock_data(&table, records);
        }
        Ok(())
    }

    pub fn set_current_user(&mut self, user: Option<Record>) {
        self.store.set_current_user(user);
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Split access for callers that drive the executor directly
    pub fn parts(&mut self) -> (&mut RecordStore, &QueryExecutor) {
        (&mut self.store, &self.executor)
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A query chain bound to one table of a client
/// Builder methods return the handle; the terminal methods evaluate or write
pub struct TableHandle<'a> {
    store: &'a mut RecordStore,
    executor: &'a QueryExecutor,
    builder: QueryBuilder,
}

impl<'a> TableHandle<'a> {
    fn map(self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        let TableHandle {
            store,
            executor,
            builder,
        } = self;
        TableHandle {
            store,
            executor,
            builder: f(builder),
        }
    }

    pub fn select(self, columns: &str) -> Self {
        self.map(|b| b.select(columns))
    }

    pub fn filter(self, field: &str, op: FilterOp) -> Self {
        self.map(|b| b.filter(field, op))
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.map(|b| b.eq(field, value))
    }

    pub fn neq(self, field: &str, value: impl Into<Value>) -> Self {
        self.map(|b| b.neq(field, value))
    }

    pub fn gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.map(|b| b.gt(field, value))
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.map(|b| b.gte(field, value))
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.map(|b| b.lt(field, value))
    }

    pub fn lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.map(|b| b.lte(field, value))
    }

    pub fn like(self, field: &str, pattern: &str) -> Self {
        self.map(|b| b.like(field, pattern))
    }

    pub fn in_<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.map(|b| b.in_(field, values))
    }

    pub fn order(self, field: &str) -> Self {
        self.map(|b| b.order(field))
    }

    pub fn order_by(self, field: &str, ascending: bool) -> Self {
        self.map(|b| b.order_by(field, ascending))
    }

    pub fn order_desc(self, field: &str) -> Self {
        self.map(|b| b.order_desc(field))
    }

    pub fn limit(self, count: usize) -> Self {
        self.map(|b| b.limit(count))
    }

    /// Evaluate the read
    pub fn execute(self) -> Response<Vec<Record>> {
        self.executor.select(self.store, &self.builder.build())
    }

    /// Evaluate the read and keep only the first row
    pub fn single(self) -> Response<Option<Record>> {
        self.executor.single(self.store, &self.builder.build())
    }

    pub fn insert(self, records: impl IntoRecords) -> Response<Vec<Record>> {
        let table = self.builder.build().table;
        self.executor.insert(self.store, &table, records.into_records())
    }

    /// Merge one patch object into every matching record
    /// Anything other than exactly one object writes nothing
    pub fn update(self, patch: impl IntoRecords) -> Response<Vec<Record>> {
        let query = self.builder.build();
        let mut patches = patch.into_records();
        if patches.len() != 1 {
            warn!(table = %query.table, patches = patches.len(), "update needs exactly one patch object");
            return Response::ok(Vec::new());
        }
        let patch = patches.remove(0);
        self.executor.update(self.store, &query, &patch)
    }

    pub fn delete(self) -> Response<Vec<Record>> {
        self.executor.delete(self.store, &self.builder.build())
    }

    /// Upsert keyed on `id`
    pub fn upsert(self, records: impl IntoRecords) -> Response<Vec<Record>> {
        self.upsert_on(records, None)
    }

    /// Upsert keyed on `on_conflict` (`id` when None)
    pub fn upsert_on(self, records: impl IntoRecords, on_conflict: Option<&str>) -> Response<Vec<Record>> {
        let table = self.builder.build().table;
        self.executor
            .upsert(self.store, &table, records.into_records(), on_conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fluent_chain() {
        let mut client = MockClient::new();
        client.set_mock_data(
            "workouts",
            json!([
                {"id": "w1", "user_id": "u1", "volume": 1200},
                {"id": "w2", "user_id": "u2", "volume": 800},
                {"id": "w3", "user_id": "u1", "volume": 900}
            ]),
        );

        let response = client
            .from("workouts")
            .select("*")
            .eq("user_id", "u1")
            .order_desc("volume")
            .limit(1)
            .execute();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0]["id"], json!("w1"));
    }

    #[test]
    fn test_single_through_handle() {
        let mut client = MockClient::new();
        client.set_mock_data("profiles", json!({"id": "p1", "user_id": "u1"}));

        let profile = client.from("profiles").eq("user_id", "u1").single();
        assert_eq!(profile.data.unwrap()["id"], json!("p1"));

        let missing = client.from("profiles").eq("user_id", "u9").single();
        assert!(missing.is_ok());
        assert!(missing.data.is_none());
    }

    #[test]
    fn test_writes_through_handle() {
        let mut client = MockClient::new();
        let inserted = client
            .from("exercises")
            .insert(json!([{"name": "squat"}, {"name": "deadlift"}]));
        assert_eq!(inserted.data.len(), 2);

        let updated = client
            .from("exercises")
            .eq("name", "squat")
            .update(json!({"muscle": "legs"}));
        assert_eq!(updated.data[0]["muscle"], json!("legs"));

        let deleted = client.from("exercises").like("name", "%lift").delete();
        assert_eq!(deleted.data.len(), 1);
        assert_eq!(client.store().row_count("exercises"), 1);

        let id = updated.data[0]["id"].clone();
        let upserted = client.from("exercises").upsert(json!({"id": id, "muscle": "quads"}));
        assert_eq!(upserted.data[0]["name"], json!("squat"));
        assert_eq!(client.store().row_count("exercises"), 1);
    }

    #[test]
    fn test_update_needs_exactly_one_patch_object() {
        let mut client = MockClient::new();
        client.set_mock_data("exercises", json!([{"id": "e1", "name": "squat"}]));
        let before = client.store().rows("exercises").to_vec();

        let scalar = client.from("exercises").eq("id", "e1").update(json!("legs"));
        assert!(scalar.is_ok());
        assert!(scalar.data.is_empty());

        let several = client
            .from("exercises")
            .eq("id", "e1")
            .update(json!([{"muscle": "legs"}, {"muscle": "back"}]));
        assert!(several.data.is_empty());

        let empty = client.from("exercises").eq("id", "e1").update(json!([]));
        assert!(empty.data.is_empty());

        assert_eq!(client.store().rows("exercises"), before.as_slice());
        assert!(!client.store().rows("exercises")[0].contains_key("updated_at"));
    }

    #[test]
    fn test_load_fixtures() {
        let mut client = MockClient::new();
        client
            .load_fixtures(json!({"workouts": [{"id": 1}], "sets": [{"id": 2}, {"id": 3}]}))
            .unwrap();
        assert_eq!(client.store().row_count("workouts"), 1);
        assert_eq!(client.store().row_count("sets"), 2);

        assert!(client.load_fixtures(json!({"workouts": {"id": 1}})).is_err());
        assert!(client.load_fixtures(json!([1, 2])).is_err());
    }

    #[test]
    fn test_reset_and_current_user() {
        let mut client = MockClient::new();
        let user = json!({"id": "u1", "email": "a@b.c"}).as_object().cloned();
        client.set_current_user(user.clone());
        assert_eq!(client.auth().get_user().data.user, user);

        client.set_mock_data("workouts", json!([{"id": 1}]));
        client.reset_mock_data();
        assert!(client.auth().get_session().data.session.is_none());
        assert_eq!(client.store().row_count("workouts"), 0);
    }

    #[test]
    fn test_storage_stub() {
        let client = MockClient::new();
        let upload = client.storage().from("avatars").upload("a.png", &[1, 2, 3]);
        assert_eq!(upload.data.path, "a.png");
    }

    #[test]
    fn test_channel_ignores_table_writes() {
        let mut client = MockClient::new();
        let mut events = 0;
        let mut channel = client
            .channel("workouts_changes")
            .on("postgres_changes", |_payload| events += 1);
        channel.subscribe();

        client.from("workouts").insert(json!({"id": "w1"}));

        assert!(channel.is_subscribed());
        assert_eq!(events, 0);
    }
}
