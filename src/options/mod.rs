//! Region and runtime options.
//!
//! Options are only declared here. The Cloud Functions runtime enforces memory and
//! timeouts; this crate validates the values and writes them into the deploy manifest.
//!
//! ```rust
//! use firebase_functions::options::{self, Memory, RuntimeOptions};
//!
//! let builder = options::region(&["europe-west1"])
//!     .and_then(|b| b.run_with(RuntimeOptions {
//!         memory: Some(Memory::Mb512),
//!         timeout_seconds: Some(120),
//!         ..Default::default()
//!     }))
//!     .unwrap();
//! let _trigger = builder.database_ref("/users/{uid}");
//! ```

#[cfg(test)]
mod tests;

use crate::auth::UserBuilder;
use crate::database::RefBuilder;
use crate::firestore::DocumentBuilder;
use crate::https::{HttpsFunction, IntoResponse};
use crate::pubsub::{ScheduleBuilder, TopicBuilder};
use crate::storage::{BucketBuilder, ObjectBuilder};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use thiserror::Error;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-central1";

/// Longest timeout a background or HTTPS function may declare.
pub const MAX_TIMEOUT_SECONDS: u32 = 540;

/// Regions accepted by `region()`.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "us-central1",
    "us-east1",
    "us-east4",
    "us-west1",
    "us-west2",
    "us-west3",
    "us-west4",
    "europe-central2",
    "europe-west1",
    "europe-west2",
    "europe-west3",
    "europe-west6",
    "asia-east1",
    "asia-east2",
    "asia-northeast1",
    "asia-northeast2",
    "asia-northeast3",
    "asia-south1",
    "asia-southeast1",
    "asia-southeast2",
    "australia-southeast1",
    "northamerica-northeast1",
    "southamerica-east1",
];

/// Errors raised by invalid region or runtime options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("at least one region must be given")]
    NoRegions,
    #[error("unsupported region '{0}'")]
    UnsupportedRegion(String),
    #[error("timeout of {0}s exceeds the maximum of 540s")]
    TimeoutTooLong(u32),
    #[error("invalid memory '{0}', expected one of 128MB, 256MB, 512MB, 1GB, 2GB, 4GB, 8GB")]
    InvalidMemory(String),
    #[error("min_instances ({min}) is greater than max_instances ({max})")]
    InstanceBounds { min: u32, max: u32 },
}

/// Memory available to a function instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Memory {
    Mb128,
    Mb256,
    Mb512,
    Gb1,
    Gb2,
    Gb4,
    Gb8,
}

impl Memory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Memory::Mb128 => "128MB",
            Memory::Mb256 => "256MB",
            Memory::Mb512 => "512MB",
            Memory::Gb1 => "1GB",
            Memory::Gb2 => "2GB",
            Memory::Gb4 => "4GB",
            Memory::Gb8 => "8GB",
        }
    }

    pub fn megabytes(&self) -> u32 {
        match self {
            Memory::Mb128 => 128,
            Memory::Mb256 => 256,
            Memory::Mb512 => 512,
            Memory::Gb1 => 1024,
            Memory::Gb2 => 2048,
            Memory::Gb4 => 4096,
            Memory::Gb8 => 8192,
        }
    }
}

impl FromStr for Memory {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "128MB" => Ok(Memory::Mb128),
            "256MB" => Ok(Memory::Mb256),
            "512MB" => Ok(Memory::Mb512),
            "1GB" => Ok(Memory::Gb1),
            "2GB" => Ok(Memory::Gb2),
            "4GB" => Ok(Memory::Gb4),
            "8GB" => Ok(Memory::Gb8),
            _ => Err(OptionsError::InvalidMemory(s.to_string())),
        }
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Memory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Memory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Runtime settings declared for a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,
}

impl RuntimeOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if let Some(timeout) = self.timeout_seconds {
            if timeout > MAX_TIMEOUT_SECONDS {
                return Err(OptionsError::TimeoutTooLong(timeout));
            }
        }
        if let (Some(min), Some(max)) = (self.min_instances, self.max_instances) {
            if min > max {
                return Err(OptionsError::InstanceBounds { min, max });
            }
        }
        Ok(())
    }
}

/// Regions plus runtime options attached to a trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOptions {
    pub regions: Vec<String>,
    pub runtime: RuntimeOptions,
}

impl DeploymentOptions {
    /// The configured regions, or the default region when none were set.
    pub fn effective_regions(&self) -> Vec<String> {
        if self.regions.is_empty() {
            vec![DEFAULT_REGION.to_string()]
        } else {
            self.regions.clone()
        }
    }

    pub fn primary_region(&self) -> &str {
        self.regions
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REGION)
    }
}

fn validate_regions(regions: &[&str]) -> Result<Vec<String>, OptionsError> {
    if regions.is_empty() {
        return Err(OptionsError::NoRegions);
    }
    regions
        .iter()
        .map(|region| {
            if SUPPORTED_REGIONS.contains(region) {
                Ok(region.to_string())
            } else {
                Err(OptionsError::UnsupportedRegion(region.to_string()))
            }
        })
        .collect()
}

/// Starts a builder pinned to the given regions.
pub fn region(regions: &[&str]) -> Result<FunctionBuilder, OptionsError> {
    FunctionBuilder::default().region(regions)
}

/// Starts a builder with the given runtime options.
pub fn run_with(options: RuntimeOptions) -> Result<FunctionBuilder, OptionsError> {
    FunctionBuilder::default().run_with(options)
}

/// Entry point to every trigger builder, carrying region and runtime options.
#[derive(Debug, Clone, Default)]
pub struct FunctionBuilder {
    options: DeploymentOptions,
}

impl FunctionBuilder {
    pub fn region(mut self, regions: &[&str]) -> Result<Self, OptionsError> {
        self.options.regions = validate_regions(regions)?;
        Ok(self)
    }

    pub fn run_with(mut self, options: RuntimeOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        self.options.runtime = options;
        Ok(self)
    }

    pub fn options(&self) -> &DeploymentOptions {
        &self.options
    }

    /// Realtime Database reference trigger.
    pub fn database_ref(&self, path: &str) -> RefBuilder {
        RefBuilder::new(path, self.options.clone())
    }

    /// Cloud Firestore document trigger.
    pub fn firestore_document(&self, path: &str) -> DocumentBuilder {
        DocumentBuilder::new(path, self.options.clone())
    }

    /// Pub/Sub topic trigger.
    pub fn pubsub_topic(&self, topic: &str) -> TopicBuilder {
        TopicBuilder::new(topic, self.options.clone())
    }

    /// Scheduled function backed by Cloud Scheduler and Pub/Sub.
    pub fn pubsub_schedule(&self, schedule: &str) -> ScheduleBuilder {
        ScheduleBuilder::new(schedule, self.options.clone())
    }

    /// Storage trigger on a named bucket.
    pub fn storage_bucket(&self, bucket: &str) -> BucketBuilder {
        BucketBuilder::new(Some(bucket), self.options.clone())
    }

    /// Storage trigger on the project's default bucket.
    pub fn storage_object(&self) -> ObjectBuilder {
        BucketBuilder::new(None, self.options.clone()).object()
    }

    /// Firebase Authentication user trigger.
    pub fn auth_user(&self) -> UserBuilder {
        UserBuilder::new(self.options.clone())
    }

    /// HTTPS trigger.
    pub fn https_on_request<F, Fut, R>(&self, handler: F) -> HttpsFunction
    where
        F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        HttpsFunction::new(handler, self.options.clone())
    }
}
