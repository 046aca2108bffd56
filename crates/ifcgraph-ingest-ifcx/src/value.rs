//! Attribute values of IFCX fragments.

use ifcgraph_model::Scalar;
use indexmap::IndexMap;
use serde_json::Value;

/// Joins nested attribute keys when flattening. Not usable inside a real
/// attribute key segment without creating ambiguous paths.
pub const PATH_SEPARATOR: &str = "::";

/// Insertion-ordered string map. Re-inserting a key replaces the value in
/// place, so a key keeps its first-seen position.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    /// Insert only when `key` is absent.
    pub fn insert_missing(&mut self, key: impl Into<String>, value: V) {
        self.entries.entry(key.into()).or_insert(value);
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Arbitrary-depth attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(Scalar),
    List(Vec<AttrValue>),
    Map(OrderedMap<AttrValue>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// Leaves keyed by their `::`-joined path. Empty maps contribute nothing;
    /// lists are leaves.
    pub fn flatten<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a AttrValue)>) {
        match self {
            AttrValue::Map(entries) => {
                for (key, value) in entries.iter() {
                    value.flatten(&join_path(prefix, key), out);
                }
            }
            leaf => out.push((prefix.to_string(), leaf)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Scalar(s) => serde_json::to_value(s).unwrap_or(Value::Null),
            AttrValue::List(items) => Value::Array(items.iter().map(AttrValue::to_json).collect()),
            AttrValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{key}")
    }
}

/// Flatten a top-level attribute map.
pub fn flatten_attributes(attributes: &OrderedMap<AttrValue>) -> Vec<(String, &AttrValue)> {
    let mut out = Vec::new();
    for (key, value) in attributes.iter() {
        value.flatten(key, &mut out);
    }
    out
}

impl From<&Value> for AttrValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AttrValue::Scalar(Scalar::Null),
            Value::Bool(b) => AttrValue::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => AttrValue::Scalar(match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Real(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => AttrValue::Scalar(Scalar::Str(s.clone())),
            Value::Array(items) => AttrValue::List(items.iter().map(AttrValue::from).collect()),
            Value::Object(map) => {
                AttrValue::Map(map.iter().map(|(k, v)| (k.as_str(), AttrValue::from(v))).collect())
            }
        }
    }
}
