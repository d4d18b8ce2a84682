//! Email-verification state machine. Two variants exist on this backend:
//! token-driven, where the client calls the verification endpoint itself and
//! classifies the failure, and redirect-driven, where the backend already
//! classified the outcome and hands it over as a `status` query parameter.
//! Both fold a re-used token into the already-verified state instead of a
//! hard failure.

use crate::api::ApiError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// How long the redirect-driven page waits for a `status` parameter before
/// giving up on a broken redirect.
pub const REDIRECT_WAIT: Duration = Duration::from_secs(5);

/// Terminal states reachable from `Loading`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyState {
    Loading,
    Success,
    AlreadyVerified,
    Expired,
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyErrorKind {
    Expired,
    AlreadyVerified,
    Other,
}

impl VerifyErrorKind {
    /// Classifies a verification failure. The backend's structured error
    /// `code` wins when present.
    ///
    /// The substring and status-code heuristics below are a deprecated
    /// fallback for responses that carry no code; drop them once the backend
    /// always sends one.
    #[must_use]
    pub fn classify(err: &ApiError) -> Self {
        if let ApiError::Http { code: Some(code), .. } = err {
            match code.as_str() {
                "EXPIRED_TOKEN" => return Self::Expired,
                "ALREADY_VERIFIED" => return Self::AlreadyVerified,
                _ => {}
            }
        }

        let message = err.message().to_lowercase();
        if message.contains("already") {
            return Self::AlreadyVerified;
        }
        if message.contains("expired") {
            return Self::Expired;
        }
        match err.status() {
            Some(409) => Self::AlreadyVerified,
            Some(400 | 401) => Self::Expired,
            _ => Self::Other,
        }
    }
}

/// Token-driven flow with a one-shot latch: the verification call fires at
/// most once even if the driving loop re-runs.
#[derive(Debug)]
pub struct VerificationFlow {
    state: VerifyState,
    fired: bool,
}

impl VerificationFlow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: VerifyState::Loading,
            fired: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &VerifyState {
        &self.state
    }

    /// Runs the verification call once and resolves the terminal state. A
    /// second invocation returns the already-resolved state without calling
    /// `verify` again.
    pub async fn run<F, Fut>(&mut self, verify: F) -> &VerifyState
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        if self.fired {
            return &self.state;
        }
        self.fired = true;

        self.state = match verify().await {
            Ok(()) => VerifyState::Success,
            Err(err) => match VerifyErrorKind::classify(&err) {
                VerifyErrorKind::Expired => VerifyState::Expired,
                VerifyErrorKind::AlreadyVerified => VerifyState::AlreadyVerified,
                VerifyErrorKind::Other => VerifyState::Error(err.message().to_string()),
            },
        };
        &self.state
    }
}

impl Default for VerificationFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a redirect-delivered `status` (and optional `reason`) to a state.
/// The backend already classified the outcome; no network call happens here.
#[must_use]
pub fn map_redirect_status(status: &str, reason: Option<&str>) -> VerifyState {
    match status {
        "success" => VerifyState::Success,
        "already_verified" => VerifyState::AlreadyVerified,
        "expired" | "invalid" => VerifyState::Expired,
        _ => VerifyState::Error(
            reason
                .unwrap_or("A temporary error occurred. Try again later.")
                .to_string(),
        ),
    }
}

/// Awaits the redirect outcome with a fixed timeout. No parameter within
/// [`REDIRECT_WAIT`] means the redirect broke; the page must not sit on a
/// spinner forever.
pub async fn resolve_redirect<F>(status: F) -> VerifyState
where
    F: Future<Output = Option<(String, Option<String>)>>,
{
    match timeout(REDIRECT_WAIT, status).await {
        Ok(Some((status, reason))) => map_redirect_status(&status, reason.as_deref()),
        Ok(None) | Err(_) => {
            VerifyState::Error("invalid access: no verification result received".to_string())
        }
    }
}

/// Ephemeral signup-side state: which user still needs to verify, and
/// whether the mail went out. Cleared on success or when the user moves on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingVerification {
    pub pending_user_id: Option<i64>,
    pub verification_sent: bool,
}

impl PendingVerification {
    pub fn mark_sent(&mut self, user_id: i64) {
        self.pending_user_id = Some(user_id);
        self.verification_sent = true;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn http_error(status: u16, code: Option<&str>, message: &str) -> ApiError {
        ApiError::Http {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn structured_code_wins_over_message() {
        let err = http_error(500, Some("EXPIRED_TOKEN"), "already did this");
        assert_eq!(VerifyErrorKind::classify(&err), VerifyErrorKind::Expired);
    }

    #[test]
    fn substring_fallback_detects_already_and_expired() {
        let already = http_error(500, None, "Token already used");
        assert_eq!(
            VerifyErrorKind::classify(&already),
            VerifyErrorKind::AlreadyVerified
        );

        let expired = http_error(500, None, "Link expired");
        assert_eq!(VerifyErrorKind::classify(&expired), VerifyErrorKind::Expired);
    }

    #[test]
    fn status_fallback_applies_last() {
        assert_eq!(
            VerifyErrorKind::classify(&http_error(409, None, "Conflict")),
            VerifyErrorKind::AlreadyVerified
        );
        assert_eq!(
            VerifyErrorKind::classify(&http_error(400, None, "Bad Request")),
            VerifyErrorKind::Expired
        );
        assert_eq!(
            VerifyErrorKind::classify(&http_error(500, None, "boom")),
            VerifyErrorKind::Other
        );
    }

    #[tokio::test]
    async fn consumed_token_folds_into_already_verified() {
        let mut flow = VerificationFlow::new();
        let state = flow
            .run(|| async {
                Err(http_error(409, Some("ALREADY_VERIFIED"), "Already verified"))
            })
            .await;
        assert_eq!(*state, VerifyState::AlreadyVerified);
    }

    #[tokio::test]
    async fn latch_fires_verification_at_most_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut flow = VerificationFlow::new();

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            flow.run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*flow.state(), VerifyState::Success);
    }

    #[tokio::test]
    async fn network_failure_is_a_generic_error() {
        let mut flow = VerificationFlow::new();
        let state = flow
            .run(|| async { Err(ApiError::Network("failed to fetch".to_string())) })
            .await;
        assert_eq!(*state, VerifyState::Error("failed to fetch".to_string()));
    }

    #[test]
    fn redirect_status_mapping() {
        assert_eq!(map_redirect_status("success", None), VerifyState::Success);
        assert_eq!(
            map_redirect_status("already_verified", None),
            VerifyState::AlreadyVerified
        );
        assert_eq!(map_redirect_status("expired", None), VerifyState::Expired);
        assert_eq!(map_redirect_status("invalid", None), VerifyState::Expired);
        assert_eq!(
            map_redirect_status("error", Some("mail backend down")),
            VerifyState::Error("mail backend down".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_status_times_out_to_invalid_access() {
        let state = resolve_redirect(std::future::pending()).await;
        match state {
            VerifyState::Error(message) => assert!(message.contains("invalid access")),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn present_status_resolves_immediately() {
        let state =
            resolve_redirect(std::future::ready(Some(("success".to_string(), None)))).await;
        assert_eq!(state, VerifyState::Success);
    }

    #[test]
    fn pending_verification_lifecycle() {
        let mut pending = PendingVerification::default();
        pending.mark_sent(42);
        assert_eq!(pending.pending_user_id, Some(42));
        assert!(pending.verification_sent);

        pending.clear();
        assert_eq!(pending, PendingVerification::default());
    }
}
