// Mock configuration
// Behaviour knobs of the test double, loaded from TOML or built in code
// Every knob defaults to the permissive behaviour

use crate::error::{MockError, MockResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// What a single-row read does when more than one record matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleRowPolicy {
    /// Return the first match
    #[default]
    First,
    /// Put an error in the response, like the real backend
    Strict,
}

/// Configuration for a [`MockClient`](crate::MockClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default)]
    pub single_row_policy: SingleRowPolicy,

    /// Prune fields not named in `select(...)`; off by default
    #[serde(default)]
    pub enforce_projection: bool,

    /// Tables that exist (empty) after every reset
    #[serde(default = "default_tables")]
    pub default_tables: Vec<String>,

    /// Prefix of generated record ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_tables() -> Vec<String> {
    ["users", "workouts", "exercises", "profiles"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_id_prefix() -> String {
    "id".to_string()
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            single_row_policy: SingleRowPolicy::default(),
            enforce_projection: false,
            default_tables: default_tables(),
            id_prefix: default_id_prefix(),
        }
    }
}

impl MockConfig {
    /// Strict single-row reads and enforced projection
    #[must_use]
    pub fn strict() -> Self {
        Self {
            single_row_policy: SingleRowPolicy::Strict,
            enforce_projection: true,
            ..Default::default()
        }
    }

    /// Load a TOML file and validate it
    pub fn from_file(path: &Path) -> MockResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MockResult<()> {
        if self.id_prefix.is_empty() {
            return Err(MockError::Config("id_prefix must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for name in &self.default_tables {
            if name.is_empty() {
                return Err(MockError::Config("table names must not be empty".to_string()));
            }
            if !seen.insert(name) {
                return Err(MockError::Config(format!("duplicate default table: {}", name)));
            }
        }

        Ok(())
    }
}
