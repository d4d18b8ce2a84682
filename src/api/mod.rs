//! Authenticated request pipeline for the SENTINEL backend. Every call goes
//! through [`ApiClient::request`]: the base URL is joined with the endpoint,
//! the bearer token is read from the session store and attached, the response
//! body is parsed (JSON, with a text fallback for plain-text error paths) and
//! non-2xx statuses are normalized into a single [`ApiError::Http`] value.
//! There is no refresh-and-retry: an expired token is sent as-is and the 401
//! only produces a diagnostic warning.

pub mod envelope;
pub mod error;

pub use envelope::{decode, ApiEnvelope, Enveloped, ErrorBody};
pub use error::ApiError;

use crate::session::store::SessionStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info_span, warn, Instrument};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Per-call options. Defaults to no extra headers with auth injection on.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub skip_auth: bool,
}

impl RequestOptions {
    /// Options for unauthenticated endpoints such as login and signup.
    #[must_use]
    pub fn skip_auth() -> Self {
        Self {
            headers: Vec::new(),
            skip_auth: true,
        }
    }
}

/// Request payload. Multipart bodies never get a JSON content-type; the
/// transport sets `multipart/form-data` with the boundary itself.
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Binary response from a file download, with metadata pulled from headers.
#[derive(Clone, Debug)]
pub struct BinaryResponse {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// HTTP client bound to a base URL and a session store.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: SessionStore,
}

impl ApiClient {
    /// # Errors
    /// Returns `ApiError::Config` when the underlying client cannot be built.
    pub fn new(base_url: impl Into<String>, store: SessionStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            store,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Single entry point for JSON-speaking endpoints. Returns the parsed
    /// body unchanged on 2xx; callers unwrap the envelope themselves since
    /// both enveloped and bare shapes occur across endpoints.
    ///
    /// # Errors
    /// `Network` on transport failure, `Http` on non-2xx statuses, `Parse`
    /// when a declared-JSON body does not decode, `Serialization` on invalid
    /// caller headers.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let url = join_url(&self.base_url, endpoint);
        let headers = self.assemble_headers(&body, &options)?;

        let mut builder = self.http.request(method.clone(), &url).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let span = info_span!("api.request", http.method = %method, url = %url);
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = parse_body(response).await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(failure(status, &body))
        }
    }

    /// Binary GET for file downloads. Requires the bearer header, so the
    /// session store is consulted the same way as for JSON calls.
    ///
    /// # Errors
    /// Same taxonomy as [`ApiClient::request`].
    pub async fn download(&self, endpoint: &str) -> Result<BinaryResponse, ApiError> {
        let url = join_url(&self.base_url, endpoint);
        let mut headers = HeaderMap::new();
        if let Some(bearer) = self.bearer_header()? {
            headers.insert(AUTHORIZATION, bearer);
        }

        let span = info_span!("api.download", http.method = "GET", url = %url);
        let response = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .instrument(span)
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = parse_body(response).await?;
            return Err(failure(status, &body));
        }

        let content_type = header_string(response.headers(), &CONTENT_TYPE);
        let file_name = header_string(response.headers(), &CONTENT_DISPOSITION)
            .as_deref()
            .and_then(disposition_filename);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(format!("Failed to read response body: {err}")))?
            .to_vec();

        Ok(BinaryResponse {
            bytes,
            content_type,
            file_name,
        })
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn get_with(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, RequestBody::Empty, options).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        self.post_with(endpoint, body, RequestOptions::default()).await
    }

    pub async fn post_with<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let value = encode(body)?;
        self.request(Method::POST, endpoint, RequestBody::Json(value), options)
            .await
    }

    pub async fn post_empty(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::POST, endpoint, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn post_multipart(&self, endpoint: &str, form: Form) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            endpoint,
            RequestBody::Multipart(form),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let value = encode(body)?;
        self.request(Method::PATCH, endpoint, RequestBody::Json(value), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint, RequestBody::Empty, RequestOptions::default())
            .await
    }

    /// Builds the header map: caller headers first, a JSON content-type
    /// default only for JSON bodies the caller did not type themselves, and
    /// the bearer token unless the call opted out.
    fn assemble_headers(
        &self,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiError::Serialization(format!("Invalid header name {name:?}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ApiError::Serialization(format!("Invalid header value: {err}")))?;
            headers.insert(name, value);
        }

        if matches!(body, RequestBody::Json(_)) && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if !options.skip_auth {
            if let Some(bearer) = self.bearer_header()? {
                headers.insert(AUTHORIZATION, bearer);
            }
        }

        Ok(headers)
    }

    /// Pure read of the persisted session; no refresh. An empty token means
    /// no header at all.
    fn bearer_header(&self) -> Result<Option<HeaderValue>, ApiError> {
        let Some(session) = self.store.read() else {
            return Ok(None);
        };
        let token = session.access_token();
        if token.is_empty() {
            return Ok(None);
        }
        HeaderValue::from_str(&format!("Bearer {token}"))
            .map(Some)
            .map_err(|err| ApiError::Serialization(format!("Invalid access token: {err}")))
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Network(format!("Unable to reach the server: {err}"))
}

/// Declared-JSON bodies must decode or the call fails with `Parse`; anything
/// else is read as text with a best-effort JSON parse and a
/// `{"message": <text>}` fallback, since some backend error paths answer
/// `text/plain`.
async fn parse_body(response: Response) -> Result<Value, ApiError> {
    let declared_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));

    if declared_json {
        response
            .json::<Value>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to read response: {err}")))?;
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text })))
    }
}

/// Normalizes a non-2xx response into a single error value: `body.message`,
/// then `body.error`, then a synthesized `Error <status>: <status text>`.
fn failure(status: StatusCode, body: &Value) -> ApiError {
    if status == StatusCode::UNAUTHORIZED {
        warn!("unauthorized: access token might be expired or invalid");
    }

    let message = flatten_message(body.get("message"))
        .or_else(|| flatten_message(body.get("error")))
        .unwrap_or_else(|| {
            format!(
                "Error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Error")
            )
        });

    ApiError::Http {
        status: status.as_u16(),
        code: error_code(body),
        message,
    }
}

/// Flattens a message field that may itself be an object with a `message`.
/// Empty strings count as absent so the synthesized fallback kicks in.
fn flatten_message(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            _ => Some(Value::Object(map.clone()).to_string()),
        },
        _ => None,
    }
}

/// Machine-readable error code, preferred by callers that classify failures.
fn error_code(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(|error| error.get("code"))
        .and_then(Value::as_str)
        .or_else(|| body.get("code").and_then(Value::as_str))
        .map(str::to_string)
}

fn header_string(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Joins the configured base URL with an endpoint path. A malformed base is
/// not validated here; it simply produces a failed network call.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Pulls a `filename="..."` parameter out of a Content-Disposition header.
fn disposition_filename(disposition: &str) -> Option<String> {
    let start = disposition.find("filename=")? + "filename=".len();
    let rest = disposition[start..].trim();
    let name = rest
        .trim_start_matches('"')
        .split(['"', ';'])
        .next()?
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, Session, UserSummary};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("session.json"))
    }

    fn sample_user() -> UserSummary {
        UserSummary {
            user_id: "7f0e".to_string(),
            email: "user@sentinel.dev".to_string(),
            name: "User".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://api.local/", "/posts"), "http://api.local/posts");
        assert_eq!(join_url("http://api.local", "posts"), "http://api.local/posts");
        assert_eq!(join_url("", "/posts"), "/posts");
    }

    #[test]
    fn disposition_filename_strips_quotes() {
        assert_eq!(
            disposition_filename("attachment; filename=\"report.pdf\""),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; filename=data.csv; size=3"),
            Some("data.csv".to_string())
        );
        assert_eq!(disposition_filename("inline"), None);
    }

    #[test]
    fn flatten_message_ignores_empty_strings() {
        assert_eq!(flatten_message(Some(&json!(""))), None);
        assert_eq!(flatten_message(Some(&json!("boom"))), Some("boom".to_string()));
        assert_eq!(
            flatten_message(Some(&json!({"message": "nested"}))),
            Some("nested".to_string())
        );
    }

    #[tokio::test]
    async fn returns_2xx_body_unchanged() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"id": 1}})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let body = client.get("/posts/1").await?;

        // No implicit envelope unwrap at the pipeline level.
        assert_eq!(body, json!({"success": true, "data": {"id": 1}}));
        Ok(())
    }

    #[tokio::test]
    async fn normalizes_404_body_message() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let err = client.get("/posts/99").await.unwrap_err();

        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.status(), Some(404));
        Ok(())
    }

    #[tokio::test]
    async fn synthesizes_message_for_empty_500_body() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let err = client.get("/posts").await.unwrap_err();

        assert_eq!(err.message(), "Error 500: Internal Server Error");
        Ok(())
    }

    #[tokio::test]
    async fn attaches_bearer_from_session_store() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);
        store.write(&Session::authenticated("token-123", sample_user()))?;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/console/claims"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store)?;
        client.get("/auth/console/claims").await?;
        Ok(())
    }

    #[tokio::test]
    async fn skip_auth_sends_no_authorization_header() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);
        store.write(&Session::authenticated("token-123", sample_user()))?;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store)?;
        client
            .post_with("/auth/login", &json!({"email": "a@b.c"}), RequestOptions::skip_auth())
            .await?;

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
        Ok(())
    }

    #[tokio::test]
    async fn multipart_body_never_gets_json_content_type() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/admin/reports/metrics/import"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": 3})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let form = Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(b"a,b\n1,2".to_vec()).file_name("metrics.csv"),
        );
        client.post_multipart("/admin/reports/metrics/import", form).await?;

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        let content_type = requests[0]
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("multipart/form-data"));
        assert!(!content_type.contains("application/json"));
        Ok(())
    }

    #[tokio::test]
    async fn plain_text_body_wraps_into_message() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/resend-verification"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Verification mail sent"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let body = client.get("/api/auth/resend-verification").await?;
        assert_eq!(body, json!({"message": "Verification mail sent"}));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_json_on_2xx_is_a_parse_error() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let err = client.get("/posts").await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
        Ok(())
    }

    #[tokio::test]
    async fn error_code_is_carried_from_envelope() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/auth/verify-email"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "error": {"code": "EXPIRED_TOKEN", "message": "Token expired"}
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), store_in(&dir))?;
        let err = client.get("/api/auth/verify-email").await.unwrap_err();
        match err {
            ApiError::Http { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("EXPIRED_TOKEN"));
                assert_eq!(message, "Token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
