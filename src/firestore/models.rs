use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document as encoded in Firestore event payloads.
///
/// Deleted or missing documents arrive as `{}`, so every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(flatten)]
    pub value_type: ValueType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    StringValue(String),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    BooleanValue(bool),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
    NullValue(Option<String>),
    TimestampValue(String),
    GeoPointValue(GeoPoint),
    BytesValue(String), // base64 encoded
    ReferenceValue(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    #[serde(default)]
    pub field_paths: Vec<String>,
}

/// The `data` half of a Firestore document event.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentEventData {
    #[serde(default)]
    pub(crate) value: Option<Document>,
    #[serde(default)]
    pub(crate) old_value: Option<Document>,
    #[serde(default)]
    pub(crate) update_mask: Option<DocumentMask>,
}
