// End-to-end scenarios against the public client API

use mockbase::{Credentials, MockClient, MockConfig, QueryParser, Record};
use serde_json::json;

fn field<'a>(rows: &'a [Record], name: &str) -> Vec<&'a str> {
    rows.iter().map(|row| row[name].as_str().unwrap()).collect()
}

#[test]
fn test_filter_then_order() {
    let mut client = MockClient::new();
    client.from("t").insert(json!({"name": "a", "score": 5}));
    client.from("t").insert(json!({"name": "b", "score": 3}));
    client.from("t").insert(json!({"name": "c", "score": 5}));

    let response = client.from("t").eq("score", 5).order("name").execute();

    assert!(response.error.is_none());
    assert_eq!(field(&response.data, "name"), vec!["a", "c"]);
}

#[test]
fn test_limit_keeps_insertion_order() {
    let mut client = MockClient::new();
    client.set_mock_data(
        "t",
        json!([{"name": "first"}, {"name": "second"}, {"name": "third"}]),
    );

    let response = client.from("t").limit(2).execute();

    assert_eq!(field(&response.data, "name"), vec!["first", "second"]);
}

#[test]
fn test_like_on_email_domain() {
    let mut client = MockClient::new();
    client.set_mock_data(
        "users",
        json!([{"email": "a@example.com"}, {"email": "b@test.com"}]),
    );

    let response = client.from("users").like("email", "%@example.com").execute();

    assert_eq!(field(&response.data, "email"), vec!["a@example.com"]);
}

#[test]
fn test_update_of_missing_id_is_a_no_op() {
    let mut client = MockClient::new();
    client.set_mock_data("workouts", json!([{"id": "w1", "status": "open"}]));
    let before = client.store().rows("workouts").to_vec();

    let response = client
        .from("workouts")
        .eq("id", "x")
        .update(json!({"status": "done"}));

    assert!(response.error.is_none());
    assert!(response.data.is_empty());
    assert_eq!(client.store().rows("workouts"), before.as_slice());
}

#[test]
fn test_sign_up_session_sign_out() {
    let mut client = MockClient::new();

    let signed_up = client.auth().sign_up(&Credentials::new("e@x.com", "p"));
    assert!(signed_up.error.is_none());

    let session = client.auth().get_session().data.session.unwrap();
    assert_eq!(session.user["email"], json!("e@x.com"));

    client.auth().sign_out();
    assert!(client.auth().get_session().data.session.is_none());
}

#[test]
fn test_session_follows_profile_edits() {
    let mut client = MockClient::new();
    client.auth().sign_up(&Credentials::new("a@b.c", "p"));

    let updated = client
        .from("users")
        .eq("email", "a@b.c")
        .update(json!({"email": "moved@b.c"}));
    assert_eq!(updated.data.len(), 1);

    let session = client.auth().get_session().data.session.unwrap();
    assert_eq!(session.user["email"], json!("moved@b.c"));
    assert_eq!(client.auth().get_user().data.user.unwrap()["email"], json!("moved@b.c"));
}

#[test]
fn test_signed_up_user_is_queryable() {
    let mut client = MockClient::new();
    client.auth().sign_up(&Credentials::new("lifter@gym.io", "secret"));

    let user = client.from("users").eq("email", "lifter@gym.io").single();
    assert_eq!(user.data.unwrap()["email"], json!("lifter@gym.io"));
}

#[test]
fn test_strict_client_rejects_ambiguous_single() {
    let mut client = MockClient::with_config(&MockConfig::strict());
    client.set_mock_data("profiles", json!([{"user_id": "u1"}, {"user_id": "u1"}]));

    let response = client.from("profiles").eq("user_id", "u1").single();

    assert!(response.data.is_none());
    assert!(response.error.is_some());
}

#[test]
fn test_console_statements_match_builder_chains() {
    let mut client = MockClient::new();
    let (store, executor) = client.parts();

    for sql in [
        "INSERT INTO sets (exercise, reps, weight) VALUES ('bench', 5, 80), ('bench', 8, 70), ('row', 10, 60)",
        "UPDATE sets SET weight = 82.5 WHERE exercise = 'bench' AND reps = 5",
        "DELETE FROM sets WHERE exercise IN ('row')",
    ] {
        let response = executor.execute(store, QueryParser::parse(sql).unwrap());
        assert!(response.error.is_none(), "{}", sql);
    }

    let via_sql = executor.execute(
        store,
        QueryParser::parse("SELECT * FROM sets WHERE weight >= 70 ORDER BY weight DESC").unwrap(),
    );
    let via_builder = client.from("sets").gte("weight", 70).order_desc("weight").execute();

    assert_eq!(via_sql.data, via_builder.data);
    assert_eq!(via_builder.data.len(), 2);
    assert_eq!(via_builder.data[0]["weight"], json!(82.5));
}
