//! Equality indexing over fixed field sets.
//!
//! A [`FieldIndex`] maps a composite key — the ordered concatenation of a
//! document's stringified values for a fixed field set — to the set of
//! document ids carrying those values. The [`IndexManager`] owns one index
//! per registered field set and answers the one query shape indexes
//! accelerate: an exact-match equality conjunction over precisely the
//! registered fields. Everything else falls back to a full scan through the
//! evaluator.

use indexmap::IndexSet;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use docvault_core::{document::Id, query::ConditionNode};

// Composite-key parts are joined with a non-printing separator so adjacent
// values cannot collide ("a" + "bc" vs "ab" + "c").
const KEY_SEPARATOR: char = '\u{1f}';

fn stringify(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// An equality index over one fixed, ordered field set.
#[derive(Debug)]
pub struct FieldIndex {
    fields: Vec<String>,
    buckets: HashMap<String, IndexSet<Id>>,
}

impl FieldIndex {
    /// Creates an empty index over the given fields.
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            buckets: HashMap::new(),
        }
    }

    /// The field set this index covers, in registration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn document_key(&self, fields: &Map<String, Value>) -> String {
        self.fields
            .iter()
            .map(|field| stringify(fields.get(field)))
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string())
    }

    fn lookup_key(&self, values: &BTreeMap<&str, &Value>) -> String {
        self.fields
            .iter()
            .map(|field| stringify(values.get(field.as_str()).copied()))
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string())
    }

    /// Adds a document's id under the composite key built from its fields.
    pub fn insert(&mut self, id: &Id, fields: &Map<String, Value>) {
        let key = self.document_key(fields);
        self.buckets.entry(key).or_default().insert(id.clone());
    }

    /// Removes a document's id from the composite key built from its fields,
    /// dropping the bucket entirely once its id set empties.
    pub fn remove(&mut self, id: &Id, fields: &Map<String, Value>) {
        let key = self.document_key(fields);
        if let Some(ids) = self.buckets.get_mut(&key) {
            ids.shift_remove(id);
            if ids.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Returns the id set for the composite key built from the supplied
    /// values, or `None` when no document carries them.
    pub fn lookup(&self, values: &BTreeMap<&str, &Value>) -> Option<&IndexSet<Id>> {
        self.buckets.get(&self.lookup_key(values))
    }

    /// The number of distinct composite keys currently indexed.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no document is indexed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn clear(&mut self) {
        self.buckets.clear();
    }
}

/// Owns every registered [`FieldIndex`] and routes queries to them.
#[derive(Debug, Default)]
pub struct IndexManager {
    // Keyed by the sorted, joined field-name list, so {a, b} and {b, a}
    // resolve to the same index.
    registry: BTreeMap<String, FieldIndex>,
}

impl IndexManager {
    /// Creates a manager with no registered indexes.
    pub fn new() -> Self {
        Self::default()
    }

    fn registry_key<S: AsRef<str>>(fields: &[S]) -> String {
        let mut names: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        names.sort_unstable();
        names.join(&KEY_SEPARATOR.to_string())
    }

    /// Registers an index over a field set. Idempotent: returns `true` only
    /// when the index was newly created and therefore needs a backfill.
    pub fn register(&mut self, fields: &[&str]) -> bool {
        let key = Self::registry_key(fields);
        if self.registry.contains_key(&key) {
            return false;
        }
        let fields = fields.iter().map(|f| (*f).to_owned()).collect();
        self.registry.insert(key, FieldIndex::new(fields));
        true
    }

    /// Mutable access to the index registered over exactly this field set.
    pub fn index_mut(&mut self, fields: &[&str]) -> Option<&mut FieldIndex> {
        self.registry.get_mut(&Self::registry_key(fields))
    }

    /// True when no index is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Fans a new document out to every registered index.
    pub fn insert_document(&mut self, id: &Id, fields: &Map<String, Value>) {
        for index in self.registry.values_mut() {
            index.insert(id, fields);
        }
    }

    /// Removes a document from every registered index.
    pub fn remove_document(&mut self, id: &Id, fields: &Map<String, Value>) {
        for index in self.registry.values_mut() {
            index.remove(id, fields);
        }
    }

    /// Re-indexes an updated document: stale composite keys are removed
    /// before the new ones are added.
    pub fn replace_document(
        &mut self,
        id: &Id,
        old_fields: &Map<String, Value>,
        new_fields: &Map<String, Value>,
    ) {
        for index in self.registry.values_mut() {
            index.remove(id, old_fields);
            index.insert(id, new_fields);
        }
    }

    /// Answers an index-accelerated lookup, or `None` when the query is not
    /// a single equality conjunction whose field set exactly matches a
    /// registered index — the signal to fall back to a full scan.
    pub fn lookup(&self, query: &ConditionNode) -> Option<Vec<Id>> {
        let values = query.as_equality_conjunction()?;
        let fields: Vec<&str> = values.keys().copied().collect();
        let index = self.registry.get(&Self::registry_key(&fields))?;
        Some(
            index
                .lookup(&values)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default(),
        )
    }

    /// Rebuilds every registered index from scratch over the given projected
    /// documents. Used after a rollback and after a disk load, when index
    /// buckets may describe documents that no longer exist.
    pub fn rebuild(&mut self, documents: &[(Id, Map<String, Value>)]) {
        for index in self.registry.values_mut() {
            index.clear();
            for (id, fields) in documents {
                index.insert(id, fields);
            }
        }
    }

    /// Drops every index, registrations included. Used by delete-all.
    pub fn clear(&mut self) {
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::query::Condition;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn composite_key_lifecycle() {
        let mut index = FieldIndex::new(vec!["name".into(), "age".into()]);
        let a = Id::generate();
        let b = Id::generate();
        let milad = fields(json!({"name": "milad", "age": 30}));
        index.insert(&a, &milad);
        index.insert(&b, &milad);
        assert_eq!(index.len(), 1);

        let values = json!({"name": "milad", "age": 30});
        let lookup: BTreeMap<&str, &Value> = values
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        assert_eq!(index.lookup(&lookup).unwrap().len(), 2);

        index.remove(&a, &milad);
        assert_eq!(index.lookup(&lookup).unwrap().len(), 1);
        index.remove(&b, &milad);
        assert!(index.lookup(&lookup).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn missing_fields_stringify_as_empty() {
        let mut index = FieldIndex::new(vec!["name".into(), "nickname".into()]);
        let id = Id::generate();
        index.insert(&id, &fields(json!({"name": "milad"})));

        let values = json!({"name": "milad"});
        let lookup: BTreeMap<&str, &Value> = values
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        assert_eq!(index.lookup(&lookup).unwrap().len(), 1);
    }

    #[test]
    fn registration_is_idempotent_and_order_insensitive() {
        let mut manager = IndexManager::new();
        assert!(manager.register(&["name", "age"]));
        assert!(!manager.register(&["name", "age"]));
        assert!(!manager.register(&["age", "name"]));
    }

    #[test]
    fn lookup_requires_an_exactly_matching_field_set() {
        let mut manager = IndexManager::new();
        manager.register(&["name"]);
        let id = Id::generate();
        manager.insert_document(&id, &fields(json!({"name": "milad", "age": 30})));

        assert_eq!(
            manager.lookup(&Condition::eq("name", "milad")),
            Some(vec![id.clone()])
        );
        // Empty but eligible: the field set matches, no document does.
        assert_eq!(manager.lookup(&Condition::eq("name", "medo")), Some(vec![]));
        // Not eligible: different field set, non-equality shape.
        assert_eq!(manager.lookup(&Condition::eq("age", 30)), None);
        assert_eq!(
            manager.lookup(&Condition::eq("name", "milad").and(Condition::eq("age", 30))),
            None
        );
        assert_eq!(manager.lookup(&Condition::gt("name", "a")), None);
    }

    #[test]
    fn replace_removes_stale_composite_keys() {
        let mut manager = IndexManager::new();
        manager.register(&["name"]);
        let id = Id::generate();
        let old = fields(json!({"name": "milad"}));
        let new = fields(json!({"name": "medo"}));
        manager.insert_document(&id, &old);
        manager.replace_document(&id, &old, &new);

        assert_eq!(manager.lookup(&Condition::eq("name", "milad")), Some(vec![]));
        assert_eq!(manager.lookup(&Condition::eq("name", "medo")), Some(vec![id]));
    }

    #[test]
    fn rebuild_discards_stale_entries() {
        let mut manager = IndexManager::new();
        manager.register(&["name"]);
        let stale = Id::generate();
        let kept = Id::generate();
        manager.insert_document(&stale, &fields(json!({"name": "milad"})));
        manager.insert_document(&kept, &fields(json!({"name": "medo"})));

        manager.rebuild(&[(kept.clone(), fields(json!({"name": "medo"})))]);
        assert_eq!(manager.lookup(&Condition::eq("name", "milad")), Some(vec![]));
        assert_eq!(manager.lookup(&Condition::eq("name", "medo")), Some(vec![kept]));
    }

    #[test]
    fn clear_drops_registrations() {
        let mut manager = IndexManager::new();
        manager.register(&["name"]);
        manager.clear();
        assert!(manager.is_empty());
        assert_eq!(manager.lookup(&Condition::eq("name", "milad")), None);
    }
}
