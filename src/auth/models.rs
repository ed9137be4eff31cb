use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Firebase Auth user, as delivered by user lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub metadata: Option<UserMetadata>,
    #[serde(default)]
    pub provider_data: Vec<UserInfo>,
    pub custom_claims: Option<Map<String, Value>>,
    pub tenant_id: Option<String>,
}

impl UserRecord {
    /// Looks up a custom claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.custom_claims.as_ref().and_then(|claims| claims.get(name))
    }

    /// Provider ids the user has linked, e.g. `password` or `google.com`.
    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.provider_data.iter().map(|p| p.provider_id.as_str())
    }
}

/// Creation and sign-in times. Event payloads use `createdAt` / `lastSignedInAt`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    #[serde(alias = "createdAt")]
    pub creation_time: Option<String>,
    #[serde(alias = "lastSignedInAt")]
    pub last_sign_in_time: Option<String>,
}

/// A linked identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub uid: Option<String>,
    pub provider_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
}
