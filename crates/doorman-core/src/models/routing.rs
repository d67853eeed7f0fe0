use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::entity::{Entity, EntityKind, FieldSpec, SortKey, nullable};

/// A client-keyed routing to a set of upstream servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    pub routing_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub routing_servers: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub routing_description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub client_key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub server_index: i64,
}

impl Entity for Routing {
    const KIND: EntityKind = EntityKind::Routing;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::text("routing_name").required().len(1, 50),
        FieldSpec::list("routing_servers").required(),
        FieldSpec::text("routing_description").len(0, 255),
        FieldSpec::text("client_key").len(0, 50),
        FieldSpec::integer("server_index"),
    ];

    const SORT_FIELDS: &'static [&'static str] = &["name", "client_key", "servers"];

    fn identifier(&self) -> String {
        self.client_key.clone()
    }

    fn primary_name(&self) -> &str {
        &self.routing_name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.routing_name.as_str(), self.client_key.as_str(), self.routing_description.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::Text(self.routing_name.clone())),
            "client_key" => Some(SortKey::Text(self.client_key.clone())),
            "servers" => Some(super::count(&self.routing_servers)),
            _ => None,
        }
    }

    fn create_defaults() -> Map<String, Value> {
        let mut defaults = Map::new();
        defaults.insert("server_index".into(), json!(0));
        defaults
    }
}
