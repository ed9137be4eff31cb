use super::models::{Document, Value, ValueType};
use super::FirestoreError;
use crate::path::normalize_path;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::map::Map;
use serde_json::Value as SerdeValue;
use std::collections::HashMap;

// Converts Firestore's value map to a plain serde_json object
pub(crate) fn convert_fields_to_serde_value(
    fields: &HashMap<String, Value>,
) -> Result<SerdeValue, FirestoreError> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.clone(), convert_value_to_serde_value(value)?);
    }
    Ok(SerdeValue::Object(map))
}

pub(crate) fn convert_value_to_serde_value(value: &Value) -> Result<SerdeValue, FirestoreError> {
    use serde_json::json;
    Ok(match &value.value_type {
        ValueType::StringValue(s) => SerdeValue::String(s.clone()),
        ValueType::IntegerValue(s) => {
            let i: i64 = s.parse().map_err(|e| {
                FirestoreError::InvalidValue(format!("failed to parse integer '{}': {}", s, e))
            })?;
            SerdeValue::Number(i.into())
        }
        ValueType::DoubleValue(d) => SerdeValue::Number(
            serde_json::Number::from_f64(*d)
                .ok_or_else(|| FirestoreError::InvalidValue(format!("invalid f64 value: {}", d)))?,
        ),
        ValueType::BooleanValue(b) => SerdeValue::Bool(*b),
        ValueType::MapValue(map_value) => convert_fields_to_serde_value(&map_value.fields)?,
        ValueType::ArrayValue(array_value) => SerdeValue::Array(
            array_value
                .values
                .iter()
                .map(convert_value_to_serde_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        ValueType::NullValue(_) => SerdeValue::Null,
        ValueType::TimestampValue(s) => SerdeValue::String(s.clone()),
        ValueType::GeoPointValue(gp) => {
            json!({ "latitude": gp.latitude, "longitude": gp.longitude })
        }
        ValueType::BytesValue(s) => SerdeValue::String(s.clone()),
        ValueType::ReferenceValue(s) => SerdeValue::String(s.clone()),
    })
}

/// A snapshot of a document at event time.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    path: String,
    document: Option<Document>,
    read_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    /// `path` is relative to the database's `documents` root, e.g. `users/alice`.
    pub fn new(path: &str, document: Option<Document>, read_time: Option<DateTime<Utc>>) -> Self {
        // An empty `{}` document stands for "does not exist".
        let document = document.filter(|d| !d.name.is_empty() || !d.fields.is_empty());
        Self {
            path: normalize_path(path),
            document,
            read_time,
        }
    }

    /// The ID of the document.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// The document path relative to the `documents` root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if the document exists.
    pub fn exists(&self) -> bool {
        self.document.is_some()
    }

    /// The time the document was created. Returns `None` if the document does not exist.
    pub fn create_time(&self) -> Option<&str> {
        self.document.as_ref().and_then(|d| d.create_time.as_deref())
    }

    /// The time the document was last updated. Returns `None` if the document does not exist.
    pub fn update_time(&self) -> Option<&str> {
        self.document.as_ref().and_then(|d| d.update_time.as_deref())
    }

    /// The time of the event this snapshot belongs to.
    pub fn read_time(&self) -> Option<DateTime<Utc>> {
        self.read_time
    }

    /// The raw Firestore document.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Retrieves all fields in the document as a specific type.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    pub fn data<T: DeserializeOwned>(&self) -> Result<Option<T>, FirestoreError> {
        match self.to_json()? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Retrieves a field by dotted path, e.g. `address.city`.
    ///
    /// Returns `Ok(None)` if the document or the field does not exist.
    pub fn get<T: DeserializeOwned>(&self, field_path: &str) -> Result<Option<T>, FirestoreError> {
        let Some(doc) = &self.document else {
            return Ok(None);
        };

        let mut segments = field_path.split('.');
        let mut current = match segments.next().and_then(|first| doc.fields.get(first)) {
            Some(value) => value,
            None => return Ok(None),
        };
        for segment in segments {
            current = match &current.value_type {
                ValueType::MapValue(map) => match map.fields.get(segment) {
                    Some(value) => value,
                    None => return Ok(None),
                },
                _ => return Ok(None),
            };
        }

        let serde_value = convert_value_to_serde_value(current)?;
        Ok(Some(serde_json::from_value(serde_value)?))
    }

    /// All fields as plain JSON, `None` if the document does not exist.
    pub fn to_json(&self) -> Result<Option<SerdeValue>, FirestoreError> {
        self.document
            .as_ref()
            .map(|doc| convert_fields_to_serde_value(&doc.fields))
            .transpose()
    }
}
