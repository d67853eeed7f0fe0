use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::entity::{Entity, EntityKind, FieldSpec, SortKey, nullable};

/// A proxied API registered with the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Api {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
    pub api_name: String,
    pub api_version: String,
    #[serde(default, deserialize_with = "nullable")]
    pub api_description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub api_allowed_roles: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub api_allowed_groups: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub api_servers: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub api_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub api_allowed_retry_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_authorization_field_swap: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub api_allowed_headers: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub api_tokens_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
}

impl Entity for Api {
    const KIND: EntityKind = EntityKind::Api;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::text("api_id").read_only(),
        FieldSpec::text("api_name").required().len(1, 25),
        FieldSpec::text("api_version").required().len(1, 8),
        FieldSpec::text("api_description").required().len(1, 127),
        FieldSpec::list("api_allowed_roles").unique(),
        FieldSpec::list("api_allowed_groups").unique(),
        FieldSpec::list("api_servers"),
        FieldSpec::text("api_type"),
        FieldSpec::integer("api_allowed_retry_count"),
        FieldSpec::text("api_authorization_field_swap"),
        FieldSpec::list("api_allowed_headers").unique(),
        FieldSpec::flag("api_tokens_enabled"),
        FieldSpec::text("api_token_group"),
        FieldSpec::text("api_path").read_only(),
    ];

    const SORT_FIELDS: &'static [&'static str] = &["name", "version", "type", "servers"];

    fn identifier(&self) -> String {
        format!("{}/{}", self.api_name, self.api_version)
    }

    fn primary_name(&self) -> &str {
        &self.api_name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.api_name.as_str(), self.api_version.as_str(), self.api_description.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::Text(self.api_name.clone())),
            "version" => Some(SortKey::Text(self.api_version.clone())),
            "type" => Some(SortKey::Text(self.api_type.clone())),
            "servers" => Some(super::count(&self.api_servers)),
            _ => None,
        }
    }

    fn create_defaults() -> Map<String, Value> {
        let mut defaults = Map::new();
        defaults.insert("api_type".into(), json!("REST"));
        defaults.insert("api_allowed_retry_count".into(), json!(0));
        defaults.insert("api_tokens_enabled".into(), json!(false));
        defaults
    }
}
