//! Auth endpoints: login/signup, session invalidation, password change and
//! the email-verification calls. Login and signup skip bearer injection;
//! everything else rides the persisted token. Server-side invalidation on
//! logout is best-effort by contract: callers fire it, then clear local
//! state unconditionally via [`crate::session::AuthState`].

use crate::api::{decode, ApiClient, ApiError, RequestOptions};
use crate::session::{Role, UserSummary};
use percent_encoding::utf8_percent_encode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnstile_token: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub turnstile_token: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthLoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub password_expired: bool,
    pub user: UserSummary,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "DELETED")]
    Deleted,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub status: UserStatus,
    pub role: Role,
}

/// Authenticates and returns the token plus user snapshot. Callers feed the
/// result into `AuthState::login` to persist the session.
///
/// # Errors
/// `ApiError::Http` with the backend's message on bad credentials.
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<AuthLoginResponse, ApiError> {
    let body = client
        .post_with("/auth/login", request, RequestOptions::skip_auth())
        .await?;
    decode(body)
}

/// Registers a new account. The Turnstile token proves the bot check passed;
/// the backend rejects signups without a valid one.
///
/// # Errors
/// `ApiError::Config` when the email fails the format check locally.
pub async fn signup(client: &ApiClient, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
    if !email_regex().is_match(request.email.trim()) {
        return Err(ApiError::Config("Email address looks invalid.".to_string()));
    }

    let body = client
        .post_with("/auth/signup", request, RequestOptions::skip_auth())
        .await?;
    decode(body)
}

/// Invalidates the current server-side session. Best-effort; the caller
/// clears local state regardless of the outcome.
pub async fn logout(client: &ApiClient) -> Result<(), ApiError> {
    client.post_empty("/auth/logout").await.map(|_| ())
}

/// Invalidates every server-side session for the user.
pub async fn logout_all(client: &ApiClient) -> Result<(), ApiError> {
    client.post_empty("/auth/logout-all").await.map(|_| ())
}

pub async fn change_password(
    client: &ApiClient,
    request: &ChangePasswordRequest,
) -> Result<(), ApiError> {
    client.post("/auth/change-password", request).await.map(|_| ())
}

/// Consumes a one-time verification token. The caller classifies failures
/// through [`crate::verify::VerifyErrorKind`].
///
/// # Errors
/// `ApiError::Config` on a blank token, otherwise the pipeline taxonomy.
pub async fn verify_email(client: &ApiClient, token: &str) -> Result<(), ApiError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Config("Verification token is required.".to_string()));
    }

    let encoded = utf8_percent_encode(token, super::admin::QUERY_COMPONENT);
    client
        .get(&format!("/api/auth/verify-email?token={encoded}"))
        .await
        .map(|_| ())
}

/// Requests a fresh verification mail. This endpoint answers `text/plain`,
/// which the pipeline folds into `{"message": <text>}`.
pub async fn resend_verification(client: &ApiClient, user_id: i64) -> Result<String, ApiError> {
    let body = client
        .get(&format!("/api/auth/resend-verification?userId={user_id}"))
        .await?;
    Ok(body
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| body.to_string(), str::to_string))
}

/// Fetches the decoded claims of the current console session.
pub async fn claims(client: &ApiClient) -> Result<Value, ApiError> {
    decode(client.get("/auth/console/claims").await?)
}
