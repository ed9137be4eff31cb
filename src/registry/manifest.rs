use crate::function::{EventTrigger, Schedule};
use serde::Serialize;
use std::collections::BTreeMap;

pub const MANIFEST_SPEC_VERSION: &str = "v1alpha1";

/// Deploy manifest describing every registered endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub spec_version: String,
    pub endpoints: BTreeMap<String, Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub entry_point: String,
    pub platform: String,
    pub region: Vec<String>,
    #[serde(rename = "availableMemoryMb", skip_serializing_if = "Option::is_none")]
    pub available_memory_mb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_trigger: Option<HttpsTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_trigger: Option<EventTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Marker for HTTPS endpoints. Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpsTrigger {}
