//! Client methods for the synthesis backend.
//!
//! All endpoints live under the versioned base path except `/health`, which
//! the backend serves at the server root. Calls block to completion; there
//! are no retries. A 401 on any endpoint raises one notification on the
//! auth hub and then surfaces as [`ApiError::Unauthorized`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use url::{Position, Url};

use crate::domain::{AnalyticsMetrics, PatientData, SyntheticSample, UploadResponse};
use crate::gateway::auth_events;
use crate::http_client;

const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const MAX_ERROR_RESPONSE_BYTES: usize = 64 * 1024;

/// Successful `/auth/login` payload.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Liveness payload from the server root.
#[derive(Clone, Debug, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    #[serde(default)]
    pub environment: Option<String>,
}

/// One file in a dataset upload.
#[derive(Clone, Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Token invalid or expired")]
    Unauthorized,
    #[error("Invalid input: {0}")]
    BadRequest(String),
    #[error("Rate limited; try again later")]
    RateLimited,
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("JSON error: {0}")]
    Json(String),
}

/// Handle on the backend API. One instance per running client; the bearer
/// token is shared by every request that follows `set_auth_token`.
#[derive(Debug)]
pub struct MedicalApi {
    base_url: String,
    root_url: String,
    token: Mutex<Option<String>>,
}

impl MedicalApi {
    /// Build a client for a versioned base URL such as
    /// `http://localhost:8000/api/v1`. The health probe strips the version
    /// prefix and talks to the server root.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url)?;
        let root_url = parsed[..Position::BeforePath].to_string();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            root_url,
            token: Mutex::new(None),
        })
    }

    /// Set or clear the bearer token attached to subsequent requests.
    pub fn set_auth_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = token.filter(|token| !token.trim().is_empty());
        }
    }

    pub fn auth_token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|slot| slot.clone())
    }

    /// Exchange credentials for a bearer token. The token is not stored;
    /// call [`MedicalApi::set_auth_token`] with the result.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        let request = self.request("POST", &url);
        let response = match request.send_form(&[("username", username), ("password", password)]) {
            Ok(response) => response,
            Err(error) => return Err(self.handle_error(error)),
        };
        let body = read_body_limited(response, MAX_RESPONSE_BYTES).map_err(ApiError::Json)?;
        parse_json(&body)
    }

    /// Upload raw dataset files as one multipart request.
    pub fn upload_dataset(&self, files: &[FilePart]) -> Result<UploadResponse, ApiError> {
        let url = format!("{}/upload", self.base_url);
        let boundary = format!("medisynth-{}", uuid::Uuid::new_v4().simple());
        let body = encode_multipart(&boundary, files);
        let request = self.request("POST", &url).set(
            "Content-Type",
            &format!("multipart/form-data; boundary={boundary}"),
        );
        let response = match request.send_bytes(&body) {
            Ok(response) => response,
            Err(error) => return Err(self.handle_error(error)),
        };
        let body = read_body_limited(response, MAX_RESPONSE_BYTES).map_err(ApiError::Json)?;
        parse_json(&body)
    }

    /// Request `count` synthetic samples conditioned on a patient profile.
    pub fn generate_data(
        &self,
        patient: &PatientData,
        count: u32,
    ) -> Result<Vec<SyntheticSample>, ApiError> {
        let url = format!("{}/generate?count={count}", self.base_url);
        let request = self.request("POST", &url);
        let response = match request.send_json(patient) {
            Ok(response) => response,
            Err(error) => return Err(self.handle_error(error)),
        };
        let body = read_body_limited(response, MAX_RESPONSE_BYTES).map_err(ApiError::Json)?;
        parse_json(&body)
    }

    /// Fetch the aggregate quality, privacy and bias metrics.
    pub fn get_analytics(&self) -> Result<AnalyticsMetrics, ApiError> {
        let url = format!("{}/analytics", self.base_url);
        let request = self.request("GET", &url);
        let response = match request.call() {
            Ok(response) => response,
            Err(error) => return Err(self.handle_error(error)),
        };
        let body = read_body_limited(response, MAX_RESPONSE_BYTES).map_err(ApiError::Json)?;
        parse_json(&body)
    }

    /// URL of the `text/event-stream` training feed. No network here; the
    /// stream subscriber owns the connection.
    pub fn get_training_stream_url(&self) -> String {
        format!("{}/train", self.base_url)
    }

    /// Probe the backend. Health lives at the server root, outside the
    /// versioned base path.
    pub fn get_health(&self) -> Result<HealthCheck, ApiError> {
        let url = format!("{}/health", self.root_url);
        let request = self.request("GET", &url);
        let response = match request.call() {
            Ok(response) => response,
            Err(error) => return Err(self.handle_error(error)),
        };
        let body = read_body_limited(response, MAX_RESPONSE_BYTES).map_err(ApiError::Json)?;
        parse_json(&body)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let mut request = http_client::agent()
            .request(method, url)
            .set("Accept", "application/json");
        if let Some(token) = self.auth_token() {
            request = request.set("Authorization", &format!("Bearer {}", token.trim()));
        }
        request
    }

    fn handle_error(&self, error: ureq::Error) -> ApiError {
        match error {
            ureq::Error::Status(code, response) => {
                let body = read_body_limited(response, MAX_ERROR_RESPONSE_BYTES)
                    .unwrap_or_else(|err| err);
                let mapped = map_status_error(code, body);
                if matches!(mapped, ApiError::Unauthorized) {
                    auth_events::notify_unauthorized();
                }
                mapped
            }
            ureq::Error::Transport(err) => ApiError::Transport(err.to_string()),
        }
    }
}

fn map_status_error(code: u16, body: String) -> ApiError {
    match code {
        400 | 422 => ApiError::BadRequest(error_detail(&body)),
        401 => ApiError::Unauthorized,
        429 => ApiError::RateLimited,
        500..=599 => ApiError::ServerError(error_detail(&body)),
        _ => ApiError::Transport(format!("HTTP {code}: {body}")),
    }
}

/// Pull the human-readable message out of a backend error body. The
/// backend wraps messages as `{"detail": ...}`; anything else is returned
/// verbatim.
fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
        && let Some(detail) = value.get("detail")
    {
        if let Some(text) = detail.as_str() {
            return text.to_string();
        }
        return detail.to_string();
    }
    trimmed.to_string()
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Json("Empty response body".to_string()));
    }
    serde_json::from_str(trimmed).map_err(|err| ApiError::Json(format!("{err}: {trimmed}")))
}

fn encode_multipart(boundary: &str, files: &[FilePart]) -> Vec<u8> {
    let mut body = Vec::new();
    for file in files {
        let file_name = file.file_name.replace('"', "_");
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        body.extend_from_slice(&file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn read_body_limited(response: ureq::Response, max_bytes: usize) -> Result<String, String> {
    let bytes =
        http_client::read_response_bytes(response, max_bytes).map_err(|err| err.to_string())?;
    String::from_utf8(bytes).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> MedicalApi {
        MedicalApi::new("http://localhost:8000/api/v1").unwrap()
    }

    #[test]
    fn training_stream_url_appends_train() {
        assert_eq!(
            api().get_training_stream_url(),
            "http://localhost:8000/api/v1/train"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let api = MedicalApi::new("http://localhost:8000/api/v1/").unwrap();
        assert_eq!(
            api.get_training_stream_url(),
            "http://localhost:8000/api/v1/train"
        );
    }

    #[test]
    fn health_url_skips_version_prefix() {
        let api = api();
        assert_eq!(api.root_url, "http://localhost:8000");
        let api = MedicalApi::new("https://synth.example.org:8443/api/v1").unwrap();
        assert_eq!(api.root_url, "https://synth.example.org:8443");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(MedicalApi::new("not a url").is_err());
    }

    #[test]
    fn maps_common_statuses() {
        assert!(matches!(
            map_status_error(401, String::new()),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            map_status_error(429, String::new()),
            ApiError::RateLimited
        ));
        let err = map_status_error(422, r#"{"detail": "count too large"}"#.to_string());
        match err {
            ApiError::BadRequest(detail) => assert_eq!(detail, "count too large"),
            other => panic!("unexpected: {other:?}"),
        }
        let err = map_status_error(500, "boom".to_string());
        match err {
            ApiError::ServerError(detail) => assert_eq!(detail, "boom"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn error_detail_handles_structured_bodies() {
        assert_eq!(error_detail(r#"{"detail": "bad creds"}"#), "bad creds");
        assert_eq!(
            error_detail(r#"{"detail": [{"msg": "field required"}]}"#),
            r#"[{"msg":"field required"}]"#
        );
        assert_eq!(error_detail("plain text"), "plain text");
    }

    #[test]
    fn multipart_body_frames_each_file() {
        let files = vec![
            FilePart {
                file_name: "scan_001.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"png-bytes".to_vec(),
            },
            FilePart {
                file_name: "labels.csv".to_string(),
                content_type: "text/csv".to_string(),
                bytes: b"id,label".to_vec(),
            },
        ];
        let body = encode_multipart("b0undary", &files);
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text.matches("--b0undary\r\n").count(), 2);
        assert!(text.contains("filename=\"scan_001.png\""));
        assert!(text.contains("Content-Type: text/csv\r\n\r\nid,label\r\n"));
        assert!(text.ends_with("--b0undary--\r\n"));
    }

    #[test]
    fn blank_token_clears_authorization() {
        let api = api();
        api.set_auth_token(Some("  ".to_string()));
        assert_eq!(api.auth_token(), None);
        api.set_auth_token(Some("tok_123".to_string()));
        assert_eq!(api.auth_token().as_deref(), Some("tok_123"));
        api.set_auth_token(None);
        assert_eq!(api.auth_token(), None);
    }
}
