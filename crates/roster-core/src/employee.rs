//! Employee records, their open field map and list filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Key under which the store-assigned identifier is serialized.
pub const ID_FIELD: &str = "_id";

/// Key holding the storage-relative file name of the profile image.
pub const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// Query keys recognised by [`Filter`].
pub const FILTER_KEYS: [&str; 2] = ["department", "position"];

/// Store-assigned employee identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(Uuid);

impl EmployeeId {
    /// Generates a fresh, time-ordered identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Open mapping of field name to JSON value.
///
/// Records are schema-flexible: any field a client sends is kept. Two keys
/// are reserved and never accepted from client input, see
/// [`Fields::strip_reserved`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Removes a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Drops `_id` and `profileImage` from client-supplied input.
    ///
    /// The id belongs to the store and the image reference is only ever set
    /// from an accepted attachment.
    #[must_use]
    pub fn strip_reserved(mut self) -> Self {
        self.0.remove(ID_FIELD);
        self.0.remove(PROFILE_IMAGE_FIELD);
        self
    }

    /// Binds an attachment file name to the reserved image field.
    pub fn set_profile_image(&mut self, file_name: impl Into<String>) {
        self.0
            .insert(PROFILE_IMAGE_FIELD.to_string(), Value::String(file_name.into()));
    }

    /// Returns the bound profile image file name, if any.
    #[must_use]
    pub fn profile_image(&self) -> Option<&str> {
        self.0.get(PROFILE_IMAGE_FIELD).and_then(Value::as_str)
    }

    /// Replaces every field present in `patch`, leaving the others untouched.
    pub fn merge(&mut self, patch: Fields) {
        self.0.extend(patch.0);
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for Fields {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// A persisted employee.
///
/// Serializes flat: `{"_id": "...", "department": "eng", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Store-assigned identifier.
    #[serde(rename = "_id")]
    pub id: EmployeeId,
    /// Everything else, including `profileImage` when bound.
    #[serde(flatten)]
    pub fields: Fields,
}

impl EmployeeRecord {
    /// Creates a record from an id and its fields.
    #[must_use]
    pub fn new(id: EmployeeId, fields: Fields) -> Self {
        Self { id, fields }
    }
}

/// Exact-match constraints for listing employees.
///
/// Only `department` and `position` are recognised. An absent or empty value
/// places no constraint on that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Required department, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Required position, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl Filter {
    /// A filter with no constraints.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Requires an exact department.
    #[must_use]
    pub fn department(mut self, value: impl Into<String>) -> Self {
        self.department = Some(value.into());
        self
    }

    /// Requires an exact position.
    #[must_use]
    pub fn position(mut self, value: impl Into<String>) -> Self {
        self.position = Some(value.into());
        self
    }

    /// Drops empty values so they act as "no constraint".
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            department: self.department.filter(|v| !v.is_empty()),
            position: self.position.filter(|v| !v.is_empty()),
        }
    }

    /// Returns `true` if no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints().next().is_none()
    }

    /// Iterates over `(key, expected)` pairs of the present constraints.
    pub fn constraints(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("department", self.department.as_deref()),
            ("position", self.position.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
    }

    /// Returns `true` if every present constraint matches the record exactly.
    #[must_use]
    pub fn matches(&self, record: &EmployeeRecord) -> bool {
        self.constraints()
            .all(|(key, expected)| record.fields.get(key).is_some_and(|v| value_equals(v, expected)))
    }
}

// Strings compare verbatim; other scalars by their JSON rendering.
fn value_equals(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Null | Value::Array(_) | Value::Object(_) => false,
        other => other.to_string() == expected,
    }
}
