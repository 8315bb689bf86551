//! SD Elements REST API client.
//!
//! [`SurveyApi`] is the seam between the survey logic and the platform. The
//! production implementation, [`SdeClient`], issues blocking HTTPS requests
//! with a static token; tests substitute an in-memory implementation.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One entry of the platform-wide answer library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Answer token, e.g. "A1252".
    pub id: String,
    /// Canonical label, e.g. "PostgreSQL".
    #[serde(default)]
    pub text: String,
    /// Label of the question the answer belongs to.
    #[serde(default, rename = "display_text")]
    pub question: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Whether the answer is currently offerable.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One answer's state inside a project's survey draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftAnswer {
    /// Answer token.
    pub id: String,
    /// Whether the answer currently applies to the project.
    #[serde(default)]
    pub selected: bool,
    /// Whether selecting it is currently allowed (computed server-side).
    #[serde(default)]
    pub valid: bool,
    /// Question the answer sits under.
    #[serde(default, deserialize_with = "string_or_number")]
    pub question: String,
    /// Answer label.
    #[serde(default)]
    pub text: String,
}

/// Question references come back as either strings or integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => s,
        JsonValue::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DraftBody {
    #[serde(default)]
    answers: Vec<DraftAnswer>,
}

/// Operations the survey logic needs from the platform.
pub trait SurveyApi: Send + Sync {
    /// `GET library/answers/?page_size=N`
    fn library_answers(&self, page_size: usize) -> ApiResult<Vec<AnswerRecord>>;

    /// `GET projects/{id}/survey/draft/`
    fn survey_draft(&self, project_id: u64) -> ApiResult<Vec<DraftAnswer>>;

    /// `PATCH projects/{id}/survey/draft/{answer}/` with `{"selected": bool}`.
    fn set_answer_selected(
        &self,
        project_id: u64,
        answer_id: &str,
        selected: bool,
    ) -> ApiResult<JsonValue>;

    /// `POST projects/{id}/survey/draft/` (publish).
    fn commit_survey_draft(&self, project_id: u64) -> ApiResult<JsonValue>;

    /// `GET projects/{id}/survey/`
    fn project_survey(&self, project_id: u64) -> ApiResult<JsonValue>;
}

/// Blocking HTTP client for the SD Elements v2 API.
pub struct SdeClient {
    base_url: String,
    http: Client,
}

impl SdeClient {
    /// Build a client for `host` (e.g. `https://example.sdelements.com`).
    pub fn new(host: &str, api_key: &str, timeout: Duration) -> ApiResult<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ApiError::Api("host must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Token {}", api_key.trim()))
            .map_err(|_| ApiError::Auth("API key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("sde-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: format!("{}/api/v2/", host),
            http,
        })
    }

    /// API root, always ending in `/api/v2/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&JsonValue>,
    ) -> ApiResult<JsonValue> {
        let url = self.url(endpoint);
        debug!(%method, %url, "api request");

        let mut builder = self.http.request(method, &url).query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send()?;
        read_response(response, &url)
    }

    fn get(&self, endpoint: &str, query: &[(&str, String)]) -> ApiResult<JsonValue> {
        self.request(Method::GET, endpoint, query, None)
    }
}

/// Map a raw response onto the error taxonomy and decode its JSON body.
fn read_response(response: Response, url: &str) -> ApiResult<JsonValue> {
    let status = response.status();
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));
    let text = response.text()?;
    decode_body(status, is_html, &text, url)
}

fn decode_body(status: StatusCode, is_html: bool, text: &str, url: &str) -> ApiResult<JsonValue> {
    match status {
        StatusCode::UNAUTHORIZED => {
            return Err(ApiError::Auth(
                "authentication failed, check your API key".to_string(),
            ))
        }
        StatusCode::FORBIDDEN => {
            return Err(ApiError::Auth(
                "access forbidden, check your permissions".to_string(),
            ))
        }
        StatusCode::NOT_FOUND => return Err(ApiError::NotFound(url.to_string())),
        s if s.is_client_error() || s.is_server_error() => {
            return Err(ApiError::Api(error_message(s, text)));
        }
        _ => {}
    }

    if text.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    match serde_json::from_str(text) {
        Ok(json) => Ok(json),
        Err(_) if is_html => Err(ApiError::Auth(format!(
            "received HTML instead of JSON from {}; the token may be invalid or the endpoint may not exist",
            url
        ))),
        Err(_) => Ok(serde_json::json!({ "text": text })),
    }
}

fn error_message(status: StatusCode, text: &str) -> String {
    let detail = serde_json::from_str::<JsonValue>(text).ok().map(|body| {
        ["detail", "error", "message"]
            .iter()
            .find_map(|key| body.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    });
    match detail {
        Some(detail) => format!("{} - {}", status.as_u16(), detail),
        None => format!("HTTP {}: {}", status.as_u16(), text),
    }
}

fn from_json<T: DeserializeOwned>(value: JsonValue, what: &str) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::Api(format!("malformed {} response: {}", what, e)))
}

impl SurveyApi for SdeClient {
    fn library_answers(&self, page_size: usize) -> ApiResult<Vec<AnswerRecord>> {
        let body = self.get("library/answers/", &[("page_size", page_size.to_string())])?;
        let page: Page<AnswerRecord> = from_json(body, "library answers")?;
        Ok(page.results)
    }

    fn survey_draft(&self, project_id: u64) -> ApiResult<Vec<DraftAnswer>> {
        let body = self.get(&format!("projects/{}/survey/draft/", project_id), &[])?;
        let draft: DraftBody = from_json(body, "survey draft")?;
        Ok(draft.answers)
    }

    fn set_answer_selected(
        &self,
        project_id: u64,
        answer_id: &str,
        selected: bool,
    ) -> ApiResult<JsonValue> {
        let endpoint = format!("projects/{}/survey/draft/{}/", project_id, answer_id);
        let body = serde_json::json!({ "selected": selected });
        self.request(Method::PATCH, &endpoint, &[], Some(&body))
    }

    fn commit_survey_draft(&self, project_id: u64) -> ApiResult<JsonValue> {
        let endpoint = format!("projects/{}/survey/draft/", project_id);
        self.request(Method::POST, &endpoint, &[], Some(&serde_json::json!({})))
    }

    fn project_survey(&self, project_id: u64) -> ApiResult<JsonValue> {
        self.get(&format!("projects/{}/survey/", project_id), &[])
    }
}
