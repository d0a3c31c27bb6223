//! Document and identifier types.
//!
//! A [`Document<T>`] pairs an application payload with its assigned [`Id`].
//! The payload must serialize to a JSON object with at least one field; the
//! id is inlined into that object on serialization, so a persisted document
//! looks exactly like the payload with an extra `"id"` key.
//!
//! Runtime field access by name (needed by the indexing and evaluation
//! components) goes through [`Document::fields`], which projects the document
//! to a `serde_json` object. Compile-time access stays on the typed payload.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, to_value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// The reserved field name under which the identifier is serialized.
pub const ID_FIELD: &str = "id";

/// A validated document identifier.
///
/// Ids are UUID v4 tokens in hyphenated text form. They can only be obtained
/// from [`Id::generate`] or by parsing a string that matches the structural
/// pattern, so every `Id` held by the store is well-formed by construction.
///
/// # Example
///
/// ```ignore
/// use docvault::Id;
///
/// let id = Id::generate();
/// assert!(Id::is_valid(id.as_str()));
/// assert!(Id::parse("not-an-id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

impl Id {
    /// Generates a fresh, globally-unique identifier.
    pub fn generate() -> Self {
        Id(Uuid::new_v4().to_string())
    }

    /// Parses and validates a raw string as an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] when the string does not match the
    /// structural pattern.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        if Self::is_valid(raw) {
            Ok(Id(raw.to_owned()))
        } else {
            Err(StoreError::Validation(format!(
                "invalid document id: {raw:?}"
            )))
        }
    }

    /// Checks whether a raw string matches the identifier pattern
    /// (36 characters, RFC 4122 hyphenated text form).
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == 36 && Uuid::try_parse(raw).is_ok()
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = StoreError;

    fn from_str(raw: &str) -> StoreResult<Self> {
        Id::parse(raw)
    }
}

impl TryFrom<String> for Id {
    type Error = StoreError;

    fn try_from(raw: String) -> StoreResult<Self> {
        Id::parse(&raw)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> String {
        id.0
    }
}

/// A stored document: an application payload plus its assigned identifier.
///
/// Serializes as the payload's object with the id inlined, e.g.
/// `{"name": "milad", "age": 30, "id": "..."}`. The id is immutable once
/// assigned; update patches that name the `id` field have that key ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document<T> {
    /// The unique identifier assigned by the store.
    pub id: Id,
    /// The application payload.
    #[serde(flatten)]
    pub data: T,
}

impl<T> Document<T> {
    /// Creates a new document from an identifier and a payload.
    pub fn new(id: Id, data: T) -> Self {
        Self { id, data }
    }
}

impl<T: Serialize> Document<T> {
    /// Projects the document (payload plus id) to a JSON object for runtime
    /// field access. This is the only reflection surface the engine uses.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the payload fails to
    /// serialize, which cannot happen for payloads accepted by
    /// [`validate_payload`].
    pub fn fields(&self) -> StoreResult<Map<String, Value>> {
        match to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Serialization(
                "document did not serialize to an object".to_owned(),
            )),
        }
    }
}

impl<T: Serialize + DeserializeOwned> Document<T> {
    /// Returns a copy of this document with the patch's fields merged over
    /// the payload's top-level fields. The `id` key is skipped: identifiers
    /// never change after assignment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] when the merged object no longer
    /// deserializes into the payload type (e.g. a patch changed a field to an
    /// incompatible type).
    pub fn merge(&self, patch: &Map<String, Value>) -> StoreResult<Document<T>> {
        let mut fields = self.fields()?;
        for (key, value) in patch {
            if key == ID_FIELD {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Validates a payload before it is accepted by a create operation: it must
/// serialize to a JSON object with at least one field, and must not carry the
/// reserved `id` field (the store assigns identifiers itself).
///
/// Returns the projected object so callers do not have to serialize twice.
pub fn validate_payload<T: Serialize>(payload: &T) -> StoreResult<Map<String, Value>> {
    match to_value(payload)? {
        Value::Object(map) if !map.is_empty() => {
            if map.contains_key(ID_FIELD) {
                Err(StoreError::Validation(
                    "the id field is assigned by the store and cannot be supplied".to_owned(),
                ))
            } else {
                Ok(map)
            }
        }
        _ => Err(StoreError::Validation(
            "the document must be an object with at least one field".to_owned(),
        )),
    }
}

/// Validates an update patch: a JSON object with at least one field.
pub fn validate_patch(patch: &Value) -> StoreResult<&Map<String, Value>> {
    match patch {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(StoreError::Validation(
            "the update patch must be an object with at least one field".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn generated_ids_are_valid() {
        for _ in 0..32 {
            let id = Id::generate();
            assert!(Id::is_valid(id.as_str()));
            assert_eq!(id.as_str().len(), 36);
        }
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for raw in ["", "milad", "123", "00000000-0000-0000-0000-0000000000"] {
            assert!(!Id::is_valid(raw));
            assert!(Id::parse(raw).is_err());
        }
    }

    #[test]
    fn document_serializes_with_inlined_id() {
        let doc = Document::new(
            Id::generate(),
            Person {
                name: "milad".into(),
                age: 30,
            },
        );
        let fields = doc.fields().unwrap();
        assert_eq!(fields.get("name"), Some(&json!("milad")));
        assert_eq!(fields.get("age"), Some(&json!(30)));
        assert_eq!(fields.get(ID_FIELD), Some(&json!(doc.id.as_str())));
    }

    #[test]
    fn document_round_trips_through_json() {
        let doc = Document::new(
            Id::generate(),
            Person {
                name: "medo".into(),
                age: 25,
            },
        );
        let value = serde_json::to_value(&doc).unwrap();
        let back: Document<Person> = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn merge_overlays_fields_and_keeps_id() {
        let doc = Document::new(
            Id::generate(),
            Person {
                name: "milad".into(),
                age: 30,
            },
        );
        let patch = json!({"age": 31, "id": "ignored"});
        let merged = doc.merge(patch.as_object().unwrap()).unwrap();
        assert_eq!(merged.id, doc.id);
        assert_eq!(merged.data.age, 31);
        assert_eq!(merged.data.name, "milad");
    }

    #[test]
    fn merge_rejects_incompatible_patch() {
        let doc = Document::new(
            Id::generate(),
            Person {
                name: "milad".into(),
                age: 30,
            },
        );
        let patch = json!({"age": "thirty"});
        assert!(doc.merge(patch.as_object().unwrap()).is_err());
    }

    #[test]
    fn payload_validation_requires_non_empty_object() {
        assert!(validate_payload(&json!({"name": "milad"})).is_ok());
        assert!(validate_payload(&json!({})).is_err());
        assert!(validate_payload(&json!(null)).is_err());
        assert!(validate_payload(&json!([1, 2])).is_err());
        assert!(validate_payload(&json!("milad")).is_err());
        assert!(validate_payload(&json!({"id": "x", "name": "y"})).is_err());
    }

    #[test]
    fn patch_validation_requires_non_empty_object() {
        assert!(validate_patch(&json!({"age": 1})).is_ok());
        assert!(validate_patch(&json!({})).is_err());
        assert!(validate_patch(&json!(42)).is_err());
    }
}
