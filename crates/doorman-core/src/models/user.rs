use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::draft::Draft;
use crate::entity::{Entity, EntityKind, FieldSpec, SortKey, nullable};
use crate::error::Result;
use crate::password;

/// A gateway user with its limits and group memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub role: String,
    #[serde(default, deserialize_with = "nullable")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub rate_limit_duration: Option<i64>,
    #[serde(default)]
    pub rate_limit_duration_type: Option<String>,
    #[serde(default)]
    pub throttle_duration: Option<i64>,
    #[serde(default)]
    pub throttle_duration_type: Option<String>,
    #[serde(default)]
    pub throttle_wait_duration: Option<i64>,
    #[serde(default)]
    pub throttle_wait_duration_type: Option<String>,
    #[serde(default)]
    pub throttle_queue_limit: Option<i64>,
    /// Free-form attributes; values are usually strings but not always.
    #[serde(default, deserialize_with = "nullable")]
    pub custom_attributes: BTreeMap<String, Value>,
    #[serde(default = "default_active", deserialize_with = "active_or_default")]
    pub active: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub ui_access: bool,
}

const fn default_active() -> bool {
    true
}

fn active_or_default<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|v| v.unwrap_or(true))
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::text("username").required().len(3, 50),
        FieldSpec::text("email").required(),
        FieldSpec::text("password").required().len(16, 50).write_only(),
        FieldSpec::text("role").required().len(2, 50),
        FieldSpec::list("groups").unique(),
        FieldSpec::nullable_integer("rate_limit_duration"),
        FieldSpec::text("rate_limit_duration_type").len(0, 7),
        FieldSpec::nullable_integer("throttle_duration"),
        FieldSpec::text("throttle_duration_type").len(0, 7),
        FieldSpec::nullable_integer("throttle_wait_duration"),
        FieldSpec::text("throttle_wait_duration_type").len(0, 7),
        FieldSpec::nullable_integer("throttle_queue_limit"),
        FieldSpec::map("custom_attributes"),
        FieldSpec::flag("active"),
        FieldSpec::flag("ui_access"),
    ];

    const SORT_FIELDS: &'static [&'static str] = &["username", "role", "email", "groups"];

    fn identifier(&self) -> String {
        self.username.clone()
    }

    fn primary_name(&self) -> &str {
        &self.username
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.username.as_str(), self.email.as_str(), self.role.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "username" => Some(SortKey::Text(self.username.clone())),
            "role" => Some(SortKey::Text(self.role.clone())),
            "email" => Some(SortKey::Text(self.email.clone())),
            "groups" => Some(super::count(&self.groups)),
            _ => None,
        }
    }

    fn create_defaults() -> Map<String, Value> {
        let mut defaults = Map::new();
        defaults.insert("active".into(), json!(true));
        defaults.insert("ui_access".into(), json!(false));
        defaults
    }

    fn validate_create(draft: &Draft) -> Result<()> {
        password::require_strong(draft.text("password").unwrap_or_default())
    }
}
