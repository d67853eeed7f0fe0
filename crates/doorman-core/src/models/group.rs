use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, FieldSpec, SortKey, nullable};

/// A named set of APIs users can be granted access to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub group_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub group_description: String,
    /// `{api_name}/{api_version}` references.
    #[serde(default, deserialize_with = "nullable")]
    pub api_access: Vec<String>,
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::text("group_name").required().len(1, 50),
        FieldSpec::text("group_description").len(0, 255),
        FieldSpec::list("api_access").unique(),
    ];

    const SORT_FIELDS: &'static [&'static str] = &["name", "apis"];

    fn identifier(&self) -> String {
        self.group_name.clone()
    }

    fn primary_name(&self) -> &str {
        &self.group_name
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.group_name.as_str(), self.group_description.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "name" => Some(SortKey::Text(self.group_name.clone())),
            "apis" => Some(super::count(&self.api_access)),
            _ => None,
        }
    }
}
