// Auth simulation
// Sign-up/sign-in/sign-out against the `users` table and the store's session slot

use crate::response::Response;
use crate::storage::{
    store::RecordStore,
    table::{now_timestamp, CREATED_AT_FIELD, ID_FIELD},
    values_equal, Record,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Table the simulated users are stored in
pub const USERS_TABLE: &str = "users";

/// Email/password pair; an empty field counts as missing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthData {
    pub user: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub user: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session: Option<Session>,
}

/// Handle returned by [`AuthApi::on_auth_state_change`]
/// The simulation never emits auth events, so there is nothing to detach
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub active: bool,
}

impl Subscription {
    pub fn unsubscribe(&mut self) {
        self.active = false;
    }
}

/// Auth operations bound to one store
pub struct AuthApi<'a> {
    store: &'a mut RecordStore,
}

impl<'a> AuthApi<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Create a user and sign it in
    pub fn sign_up(self, credentials: &Credentials) -> Response<Option<AuthData>> {
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Response::failed("email and password are required");
        }

        let users = self.store.table_mut(USERS_TABLE);
        let mut user = Record::new();
        user.insert(ID_FIELD.to_string(), Value::String(users.generate_id("user")));
        user.insert("email".to_string(), Value::String(credentials.email.clone()));
        user.insert(CREATED_AT_FIELD.to_string(), Value::String(now_timestamp()));

        // id and created_at are already set, so insert stores the record as-is
        let user = users
            .insert(vec![user], "user")
            .into_iter()
            .next()
            .unwrap_or_default();

        info!(email = %credentials.email, "signed up");
        self.store.set_current_user(Some(user.clone()));
        Response::ok(Some(AuthData { user }))
    }

    /// Sign in an existing user; only the email is checked
    pub fn sign_in_with_password(self, credentials: &Credentials) -> Response<Option<AuthData>> {
        let email = Value::String(credentials.email.clone());
        let user = self
            .store
            .rows(USERS_TABLE)
            .iter()
            .find(|user| user.get("email") == Some(&email))
            .cloned();

        match user {
            Some(user) => {
                info!(email = %credentials.email, "signed in");
                self.store.set_current_user(Some(user.clone()));
                Response::ok(Some(AuthData { user }))
            }
            None => Response::failed("user not found"),
        }
    }

    /// Clear the session; always succeeds
    pub fn sign_out(self) -> Response<()> {
        if self.store.current_user().is_some() {
            info!("signed out");
        }
        self.store.set_current_user(None);
        Response::ok(())
    }

    pub fn get_user(&self) -> Response<UserData> {
        Response::ok(UserData {
            user: self.session_user(),
        })
    }

    pub fn get_session(&self) -> Response<SessionData> {
        Response::ok(SessionData {
            session: self.session_user().map(|user| Session { user }),
        })
    }

    /// The signed-in user as currently stored in `users`
    /// Falls back to the session's own copy when the row is gone or was never stored
    fn session_user(&self) -> Option<Record> {
        let current = self.store.current_user()?;
        let stored = current.get(ID_FIELD).and_then(|id| {
            self.store.rows(USERS_TABLE).iter().find(|row| {
                row.get(ID_FIELD)
                    .map_or(false, |value| values_equal(value, id))
            })
        });
        Some(stored.unwrap_or(current).clone())
    }

    /// Register an auth listener
    /// The callback is accepted for interface parity and never invoked
    pub fn on_auth_state_change<F>(&self, _callback: F) -> Subscription
    where
        F: FnMut(&str, Option<&Session>),
    {
        Subscription { active: true }
    }
}
