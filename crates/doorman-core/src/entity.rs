//! Entity schemas.
//!
//! Every managed resource (API, routing, user, group, role) implements
//! [`Entity`]. The trait carries a static field schema that drives draft
//! editing and create-time validation, plus the handful of per-type facts
//! the generic views need: the path identifier, the primary name used for
//! delete confirmation, the search fields and the sort keys.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::draft::Draft;
use crate::error::{ConsoleError, Result};

/// The five resource families managed by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Api,
    Routing,
    User,
    Group,
    Role,
}

impl EntityKind {
    /// All kinds, in menu order.
    pub const ALL: [Self; 5] = [Self::Api, Self::Routing, Self::User, Self::Group, Self::Role];

    /// Path segment of the management API family (`/platform/{family}`).
    #[must_use]
    pub const fn family(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Routing => "routing",
            Self::User => "user",
            Self::Group => "group",
            Self::Role => "role",
        }
    }

    /// Plural name: the list wrapper field and the console route segment.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Api => "apis",
            Self::Routing => "routings",
            Self::User => "users",
            Self::Group => "groups",
            Self::Role => "roles",
        }
    }

    /// Session-store slot holding the most recently selected record.
    #[must_use]
    pub const fn cache_slot(self) -> &'static str {
        match self {
            Self::Api => "selectedApi",
            Self::Routing => "selectedRouting",
            Self::User => "selectedUser",
            Self::Group => "selectedGroup",
            Self::Role => "selectedRole",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Routing => "routing",
            Self::User => "user",
            Self::Group => "group",
            Self::Role => "role",
        }
    }

    /// Split a human identifier into path segments.
    ///
    /// APIs are addressed as `{name}/{version}`; every other kind uses a
    /// single segment, even if it contains a `/`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] for an empty key, or an API key
    /// without a version.
    pub fn segments(self, key: &str) -> Result<Vec<String>> {
        if key.is_empty() {
            return Err(ConsoleError::Validation(format!(
                "{} identifier must not be empty",
                self.label()
            )));
        }
        match self {
            Self::Api => match key.split_once('/') {
                Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                    Ok(vec![name.to_owned(), version.to_owned()])
                }
                _ => Err(ConsoleError::Validation(format!(
                    "API identifier must look like <name>/<version>, got '{key}'"
                ))),
            },
            _ => Ok(vec![key.to_owned()]),
        }
    }

    /// Percent-encoded path of a single record, relative to `/platform`.
    ///
    /// # Errors
    ///
    /// See [`EntityKind::segments`].
    pub fn record_path(self, key: &str) -> Result<String> {
        let encoded: Vec<String> = self
            .segments(key)?
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        Ok(format!("/platform/{}/{}", self.family(), encoded.join("/")))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

impl FromStr for EntityKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.family() == s || k.plural() == s)
            .ok_or_else(|| ConsoleError::Validation(format!("unknown resource type '{s}'")))
    }
}

/// Value shape of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string.
    Text,
    /// A non-null integer.
    Integer,
    /// An integer that may be `null`.
    NullableInteger,
    /// A boolean flag.
    Bool,
    /// An ordered list of strings.
    List,
    /// A string-to-string map.
    Map,
}

impl FieldKind {
    /// Short name used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "an integer",
            Self::NullableInteger => "an integer or null",
            Self::Bool => "true or false",
            Self::List => "a list",
            Self::Map => "a key/value map",
        }
    }
}

/// One field of an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present (non-blank / non-empty) on create.
    pub required: bool,
    /// Minimum length in characters (text) checked when the field is set.
    pub min_len: usize,
    /// Maximum length in characters (text) or items (list).
    pub max_len: Option<usize>,
    /// List items must be distinct.
    pub unique: bool,
    /// Carried into the edit draft from the stored record.
    pub editable: bool,
    /// Never echoed back by the API, so never seeded into a draft.
    pub write_only: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            min_len: 0,
            max_len: None,
            unique: false,
            editable: true,
            write_only: false,
        }
    }

    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    #[must_use]
    pub const fn nullable_integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::NullableInteger)
    }

    #[must_use]
    pub const fn flag(name: &'static str) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    #[must_use]
    pub const fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::List)
    }

    #[must_use]
    pub const fn map(name: &'static str) -> Self {
        Self::new(name, FieldKind::Map)
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn len(mut self, min: usize, max: usize) -> Self {
        self.min_len = min;
        self.max_len = Some(max);
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    #[must_use]
    pub const fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }
}

/// Look up a field in a schema.
///
/// # Errors
///
/// Returns [`ConsoleError::Validation`] naming the known fields when `name`
/// is not part of the schema.
pub fn field<'s>(schema: &'s [FieldSpec], kind: EntityKind, name: &str) -> Result<&'s FieldSpec> {
    schema.iter().find(|f| f.name == name).ok_or_else(|| {
        let known: Vec<&str> = schema.iter().map(|f| f.name).collect();
        ConsoleError::Validation(format!(
            "unknown {} field '{name}' (known: {})",
            kind.label(),
            known.join(", ")
        ))
    })
}

/// A comparable sort key extracted from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Compared case-insensitively, ascending; ties fall back to the raw text.
    Text(String),
    /// Compared numerically, descending.
    Count(u64),
}

impl SortKey {
    /// Compare two keys in the fixed display direction.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (Self::Count(a), Self::Count(b)) => b.cmp(a),
            (Self::Text(_), Self::Count(_)) => Ordering::Less,
            (Self::Count(_), Self::Text(_)) => Ordering::Greater,
        }
    }
}

/// A managed resource type.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Which family this record belongs to.
    const KIND: EntityKind;

    /// Field schema used for drafts and validation.
    const SCHEMA: &'static [FieldSpec];

    /// Field names accepted by [`Entity::sort_key`], first one is the default.
    const SORT_FIELDS: &'static [&'static str];

    /// Human identifier, used both as the detail route key and (split into
    /// segments) as the record's API path.
    fn identifier(&self) -> String;

    /// Name the operator must type to confirm deletion.
    fn primary_name(&self) -> &str;

    /// Values matched by list-view search.
    fn search_fields(&self) -> Vec<&str>;

    /// Sort key for `field`, or `None` if the field is not sortable.
    fn sort_key(&self, field: &str) -> Option<SortKey>;

    /// Values a blank create form starts with.
    fn create_defaults() -> Map<String, Value> {
        Map::new()
    }

    /// Extra create-time checks beyond the schema's required/length rules.
    ///
    /// # Errors
    ///
    /// Returns a local error describing the failed check.
    fn validate_create(_draft: &Draft) -> Result<()> {
        Ok(())
    }
}

/// Deserialize `null` as the type's default.
///
/// The management API emits `null` for unset strings and lists.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Case-insensitive substring match across a record's search fields.
pub(crate) fn matches_term<E: Entity>(record: &E, needle_lower: &str) -> bool {
    record
        .search_fields()
        .iter()
        .any(|v| v.to_lowercase().contains(needle_lower))
}
