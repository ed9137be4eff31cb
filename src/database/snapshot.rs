use crate::path::{join_path, normalize_path};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A read-only view of a Realtime Database location at event time.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    instance: Option<String>,
    path: String,
    data: Value,
}

impl DataSnapshot {
    pub fn new(instance: Option<String>, path: &str, data: Value) -> Self {
        Self {
            instance,
            path: normalize_path(path),
            data,
        }
    }

    /// The last segment of the location, `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|k| !k.is_empty())
    }

    /// The location relative to the database root, without leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The database instance the event came from.
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    pub fn exists(&self) -> bool {
        !is_empty(&self.data)
    }

    /// The raw value, `None` when nothing is stored here.
    pub fn val(&self) -> Option<&Value> {
        if self.exists() {
            Some(&self.data)
        } else {
            None
        }
    }

    /// Deserializes the value. Returns `Ok(None)` when nothing is stored here.
    pub fn val_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.val()
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }

    /// A snapshot of a descendant location.
    pub fn child(&self, child_path: &str) -> DataSnapshot {
        let mut current = &self.data;
        for segment in child_path.split('/').filter(|s| !s.is_empty()) {
            match lookup(current, segment) {
                Some(next) => current = next,
                None => {
                    return DataSnapshot::new(
                        self.instance.clone(),
                        &join_path(&self.path, child_path),
                        Value::Null,
                    )
                }
            }
        }
        DataSnapshot::new(
            self.instance.clone(),
            &join_path(&self.path, child_path),
            current.clone(),
        )
    }

    pub fn has_child(&self, child_path: &str) -> bool {
        self.child(child_path).exists()
    }

    pub fn has_children(&self) -> bool {
        self.num_children() > 0
    }

    pub fn num_children(&self) -> usize {
        match &self.data {
            Value::Object(map) => map.values().filter(|v| !is_empty(v)).count(),
            Value::Array(items) => items.iter().filter(|v| !is_empty(v)).count(),
            _ => 0,
        }
    }

    /// Direct children, ordered by key.
    pub fn children(&self) -> Vec<DataSnapshot> {
        let mut keys: Vec<String> = match &self.data {
            Value::Object(map) => map
                .iter()
                .filter(|(_, v)| !is_empty(v))
                .map(|(k, _)| k.clone())
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, v)| !is_empty(v))
                .map(|(i, _)| i.to_string())
                .collect(),
            _ => Vec::new(),
        };
        keys.sort_by(|a, b| compare_keys(a, b));
        keys.iter().map(|k| self.child(k)).collect()
    }

    /// The stored value as JSON (`null` when empty).
    pub fn to_json(&self) -> Value {
        self.val().cloned().unwrap_or(Value::Null)
    }
}

fn lookup<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.values().all(is_empty),
        _ => false,
    }
}

// Integer-like keys sort numerically before other keys, as the database orders them.
fn compare_keys(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Applies a write delta to the data that was stored before the event.
///
/// Object keys merge recursively, `null` removes a key and any other value replaces
/// the node. Objects left without children collapse to `null`.
pub(crate) fn apply_delta(before: &Value, delta: &Value) -> Value {
    match delta {
        Value::Object(changes) => {
            let mut merged = match before {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            for (key, change) in changes {
                if change.is_null() {
                    merged.remove(key);
                    continue;
                }
                let previous = merged.get(key).cloned().unwrap_or(Value::Null);
                let next = apply_delta(&previous, change);
                if next.is_null() {
                    merged.remove(key);
                } else {
                    merged.insert(key.clone(), next);
                }
            }
            if merged.is_empty() {
                Value::Null
            } else {
                Value::Object(merged)
            }
        }
        other => other.clone(),
    }
}
