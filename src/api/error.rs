use std::fmt;

/// Errors surfaced by the request pipeline. `Http` keeps the normalized
/// message separate from the status so callers can match on either; the
/// optional `code` is the backend's machine-readable error code when the
/// response body carried one.
#[derive(Clone, Debug)]
pub enum ApiError {
    Config(String),
    Network(String),
    Http {
        status: u16,
        code: Option<String>,
        message: String,
    },
    Parse(String),
    Serialization(String),
}

impl ApiError {
    /// Human-readable message without any variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ApiError::Config(message)
            | ApiError::Network(message)
            | ApiError::Parse(message)
            | ApiError::Serialization(message)
            | ApiError::Http { message, .. } => message,
        }
    }

    /// HTTP status for `Http` errors, `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(message) => write!(formatter, "Config error: {message}"),
            ApiError::Network(message) => write!(formatter, "Network error: {message}"),
            // The normalized message already carries the status when the body
            // had nothing better, so it is printed bare.
            ApiError::Http { message, .. } => write!(formatter, "{message}"),
            ApiError::Parse(message) => write!(formatter, "Response error: {message}"),
            ApiError::Serialization(message) => write!(formatter, "Request error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display_is_the_bare_message() {
        let err = ApiError::Http {
            status: 404,
            code: None,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn message_strips_variant_context() {
        let err = ApiError::Network("Unable to reach the server".to_string());
        assert_eq!(err.message(), "Unable to reach the server");
        assert_eq!(err.status(), None);
    }
}
