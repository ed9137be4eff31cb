pub mod middleware;


use serde::Deserialize;

/// Error bodies returned by Google APIs and by the Realtime Database REST API.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FirebaseErrorResponse {
    /// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
    Google { error: FirebaseErrorDetails },
    /// `{"error": "Permission denied"}`
    Database { error: String },
}

#[derive(Debug, Deserialize)]
pub struct FirebaseErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

impl FirebaseErrorResponse {
    pub fn display_message(&self) -> String {
        match self {
            FirebaseErrorResponse::Google { error } => match &error.status {
                Some(status) => format!("{} ({}, code: {})", error.message, status, error.code),
                None => format!("{} (code: {})", error.message, error.code),
            },
            FirebaseErrorResponse::Database { error } => error.clone(),
        }
    }
}

/// Reads an error message from a failed response, falling back to `default_msg` and the status.
pub async fn parse_error_response(response: reqwest::Response, default_msg: &str) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => error_message(&body, default_msg, status),
        Err(_) => format!("{}: {}", default_msg, status),
    }
}

pub(crate) fn error_message(body: &str, default_msg: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<FirebaseErrorResponse>(body) {
        Ok(error) => error.display_message(),
        Err(_) => format!("{}: {}", default_msg, status),
    }
}
