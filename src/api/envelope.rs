//! Response envelope types. Most backend endpoints wrap their payload in
//! `{success, data, error, timestamp}`, but a few return the payload bare;
//! `Enveloped` makes that inconsistency a typed variant instead of an
//! any-shaped fallback.

use super::error::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured error block carried inside an envelope on failure paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

/// Standard response wrapper used by most endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub timestamp: String,
}

/// Union of the enveloped and bare response shapes. The enveloped shape is
/// tried first; anything that does not carry `success` + `data` decodes as
/// the payload itself.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Enveloped<T> {
    Wrapped(ApiEnvelope<T>),
    Bare(T),
}

impl<T> Enveloped<T> {
    /// Extracts the payload regardless of which shape the endpoint used.
    pub fn into_data(self) -> T {
        match self {
            Enveloped::Wrapped(envelope) => envelope.data,
            Enveloped::Bare(data) => data,
        }
    }
}

/// Decodes a raw response body into `T`, accepting either shape.
///
/// # Errors
/// Returns `ApiError::Parse` when the body matches neither shape.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value::<Enveloped<T>>(body)
        .map(Enveloped::into_data)
        .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
}
