//! Editable drafts.
//!
//! A [`Draft`] is the mutable working copy behind the edit and create views:
//! a JSON object whose keys are checked against the entity schema. Scalar
//! fields are set from raw operator input and coerced to the field's kind;
//! list and map fields are edited item by item.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::{self, EntityKind, FieldKind, FieldSpec};
use crate::error::{ConsoleError, Result};

/// A schema-checked JSON object being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    kind: EntityKind,
    schema: &'static [FieldSpec],
    fields: Map<String, Value>,
}

impl Draft {
    /// An empty draft seeded with `defaults`.
    #[must_use]
    pub fn blank(kind: EntityKind, schema: &'static [FieldSpec], defaults: Map<String, Value>) -> Self {
        Self {
            kind,
            schema,
            fields: defaults,
        }
    }

    /// A draft holding the editable fields of an existing record.
    ///
    /// Read-only and write-only fields are left out, as are fields that are
    /// absent or `null` in the record.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Json`] if the record does not serialize to an
    /// object.
    pub fn from_record<T: Serialize>(
        kind: EntityKind,
        schema: &'static [FieldSpec],
        record: &T,
    ) -> Result<Self> {
        let Value::Object(source) = serde_json::to_value(record)? else {
            return Err(ConsoleError::Decode(format!("{} record is not an object", kind.label())));
        };
        let fields = schema
            .iter()
            .filter(|f| f.editable && !f.write_only)
            .filter_map(|f| {
                source
                    .get(f.name)
                    .filter(|v| !v.is_null())
                    .map(|v| (f.name.to_owned(), v.clone()))
            })
            .collect();
        Ok(Self { kind, schema, fields })
    }

    /// Current value of a field, if set.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Current value of a text field, if set.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Borrow the underlying object.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The draft as a request body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    fn spec(&self, name: &str) -> Result<&'static FieldSpec> {
        entity::field(self.schema, self.kind, name)
    }

    fn spec_of_kind(&self, name: &str, wanted: FieldKind) -> Result<&'static FieldSpec> {
        let spec = self.spec(name)?;
        if spec.kind == wanted {
            Ok(spec)
        } else {
            Err(ConsoleError::Validation(format!(
                "field '{name}' is {}, not {}",
                spec.kind.describe(),
                wanted.describe()
            )))
        }
    }

    /// Set a scalar field from raw input, coercing it to the field's kind.
    ///
    /// Integers must parse; booleans accept `true/false`, `yes/no`, `on/off`
    /// and `1/0`; a nullable integer is cleared by an empty string or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] for unknown fields, list or map
    /// fields, and input that does not parse.
    pub fn set(&mut self, field: &str, raw: &str) -> Result<()> {
        let spec = self.spec(field)?;
        if !spec.editable {
            return Err(ConsoleError::Validation(format!("field '{field}' is read-only")));
        }
        let value = match spec.kind {
            FieldKind::Text => Value::String(raw.to_owned()),
            FieldKind::Integer => Value::from(parse_int(field, raw)?),
            FieldKind::NullableInteger => match raw.trim() {
                "" | "null" => Value::Null,
                other => Value::from(parse_int(field, other)?),
            },
            FieldKind::Bool => Value::Bool(parse_bool(field, raw)?),
            FieldKind::List | FieldKind::Map => {
                return Err(ConsoleError::Validation(format!(
                    "field '{field}' is {}; add or remove items instead",
                    spec.kind.describe()
                )));
            }
        };
        self.fields.insert(field.to_owned(), value);
        Ok(())
    }

    /// Append an item to a list field.
    ///
    /// The item is trimmed first. Empty items are rejected, as are
    /// duplicates in lists whose items must be unique.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] when the item is rejected or the
    /// field is not a list.
    pub fn push(&mut self, field: &str, item: &str) -> Result<()> {
        let spec = self.spec_of_kind(field, FieldKind::List)?;
        let item = item.trim();
        if item.is_empty() {
            return Err(ConsoleError::Validation(format!("cannot add an empty item to '{field}'")));
        }
        let list = self.list_mut(field)?;
        if spec.unique && list.iter().any(|v| v.as_str() == Some(item)) {
            return Err(ConsoleError::Validation(format!("'{item}' is already in '{field}'")));
        }
        if let Some(max) = spec.max_len {
            if list.len() >= max {
                return Err(ConsoleError::Validation(format!(
                    "'{field}' holds at most {max} items"
                )));
            }
        }
        list.push(Value::String(item.to_owned()));
        Ok(())
    }

    /// Remove the item at `index` from a list field, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] for an out-of-range index or a
    /// non-list field.
    pub fn remove(&mut self, field: &str, index: usize) -> Result<Value> {
        self.spec_of_kind(field, FieldKind::List)?;
        let list = self.list_mut(field)?;
        if index >= list.len() {
            return Err(ConsoleError::Validation(format!(
                "'{field}' has {} item(s), no index {index}",
                list.len()
            )));
        }
        Ok(list.remove(index))
    }

    /// Insert or overwrite a key in a map field.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] when the key or value is blank or
    /// the field is not a map.
    pub fn put_entry(&mut self, field: &str, key: &str, value: &str) -> Result<()> {
        self.spec_of_kind(field, FieldKind::Map)?;
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return Err(ConsoleError::Validation(format!(
                "'{field}' entries need both a key and a value"
            )));
        }
        self.map_mut(field)?
            .insert(key.to_owned(), Value::String(value.to_owned()));
        Ok(())
    }

    /// Remove a key from a map field. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] when the field is not a map.
    pub fn remove_entry(&mut self, field: &str, key: &str) -> Result<bool> {
        self.spec_of_kind(field, FieldKind::Map)?;
        Ok(self.map_mut(field)?.remove(key).is_some())
    }

    /// Check required fields and length bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] listing every missing field, or
    /// the first field outside its length bounds.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = self
            .schema
            .iter()
            .filter(|f| f.required && !self.is_present(f))
            .map(|f| f.name)
            .collect();
        if !missing.is_empty() {
            return Err(ConsoleError::Validation(format!(
                "please fill in all required fields: {}",
                missing.join(", ")
            )));
        }

        for spec in self.schema {
            let Some(Value::String(text)) = self.fields.get(spec.name) else {
                continue;
            };
            let len = text.chars().count();
            let too_short = spec.required && len < spec.min_len;
            let too_long = spec.max_len.is_some_and(|max| len > max);
            if too_short || too_long {
                return Err(ConsoleError::Validation(match spec.max_len {
                    Some(max) if spec.min_len == 0 => {
                        format!("'{}' must be at most {max} characters long", spec.name)
                    }
                    Some(max) => format!(
                        "'{}' must be {}-{max} characters long",
                        spec.name, spec.min_len
                    ),
                    None => format!(
                        "'{}' must be at least {} characters long",
                        spec.name, spec.min_len
                    ),
                }));
            }
        }
        Ok(())
    }

    fn is_present(&self, spec: &FieldSpec) -> bool {
        match self.fields.get(spec.name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(entries)) => !entries.is_empty(),
            Some(_) => true,
        }
    }

    fn list_mut(&mut self, field: &str) -> Result<&mut Vec<Value>> {
        let slot = self
            .fields
            .entry(field.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut()
            .ok_or_else(|| ConsoleError::Validation(format!("field '{field}' does not hold a list")))
    }

    fn map_mut(&mut self, field: &str) -> Result<&mut Map<String, Value>> {
        let slot = self
            .fields
            .entry(field.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        slot.as_object_mut()
            .ok_or_else(|| ConsoleError::Validation(format!("field '{field}' does not hold a map")))
    }
}

fn parse_int(field: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ConsoleError::Validation(format!("field '{field}' expects an integer, got '{raw}'")))
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConsoleError::Validation(format!(
            "field '{field}' expects true or false, got '{raw}'"
        ))),
    }
}

/// Shallow-merge `draft` over `base`. `null` draft values keep the base value.
pub(crate) fn merge(base: &mut Map<String, Value>, draft: &Map<String, Value>) {
    for (key, value) in draft {
        if !value.is_null() {
            base.insert(key.clone(), value.clone());
        }
    }
}
