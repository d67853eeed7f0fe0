use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, FieldSpec, SortKey, nullable};

/// A role and the management permissions it grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Role {
    pub role_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub role_description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_users: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_apis: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_endpoints: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_groups: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_roles: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_routings: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_gateway: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub manage_subscriptions: bool,
}

impl Role {
    /// Names of the permissions this role grants.
    #[must_use]
    pub fn permissions(&self) -> Vec<&'static str> {
        [
            ("manage_users", self.manage_users),
            ("manage_apis", self.manage_apis),
            ("manage_endpoints", self.manage_endpoints),
            ("manage_groups", self.manage_groups),
            ("manage_roles", self.manage_roles),
            ("manage_routings", self.manage_routings),
            ("manage_gateway", self.manage_gateway),
            ("manage_subscriptions", self.manage_subscriptions),
        ]
        .into_iter()
        .filter_map(|(name, granted)| granted.then_some(name))
        .collect()
    }
}

impl Entity for Role {
    const KIND: EntityKind = EntityKind::Role;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::text("role_name").required().len(1, 50),
        FieldSpec::text("role_description").len(0, 255),
        FieldSpec::flag("manage_users"),
        FieldSpec::flag("manage_apis"),
        FieldSpec::flag("manage_endpoints"),
        FieldSpec::flag("manage_groups"),
        FieldSpec::flag("manage_roles"),
        FieldSpec::flag("manage_routings"),
        FieldSpec::flag("manage_gateway"),
        FieldSpec::flag("manage_subscriptions"),
    ];

    const SORT_FIELDS: &'static [&'static str] = &["name", "permissions"];

    fn identifier(&self) -> String {
        self.role_name.clone()
    }

    fn primary_name(&self) -> &str {
        &self.role_name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.role_name.as_str(), self.role_description.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::Text(self.role_name.clone())),
            "permissions" => Some(super::count(&self.permissions())),
            _ => None,
        }
    }
}
