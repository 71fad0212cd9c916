//! # Authentication Module
//!
//! Bearer-token authentication for the hiretrack HTTP API.
//!
//! A request authenticates as:
//! - the user whose API token it presents, with that user's role, or
//! - the bootstrap ADMIN when it presents the configured admin token.
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! Authentication only identifies the caller. Whether the caller may do
//! something is decided by `hiretrack_core::authorize` in each handler.

use super::AppState;
use super::error::ApiError;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use hiretrack_core::{Action, Actor, HireError, Resource, Store, authorize};
use subtle::ConstantTimeEq;

// =============================================================================
// TOKEN COMPARISON
// =============================================================================

/// Constant-time token comparison.
///
/// Both sides are padded to the same length so `ct_eq` always runs over
/// the same number of bytes, then the lengths are compared.
pub fn tokens_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// The token from `Authorization: Bearer <token>` (or a raw `<token>`).
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve a presented token to an actor.
///
/// Every user credential is compared, so the time taken does not depend on
/// which account (if any) matched.
pub fn resolve_actor(
    store: &Store,
    admin_token: Option<&str>,
    token: &str,
) -> Result<Option<Actor>, HireError> {
    let mut actor = None;
    if let Some(expected) = admin_token
        && tokens_match(token, expected)
    {
        actor = Some(Actor::bootstrap_admin());
    }
    for (user, expected) in store.user_credentials()? {
        if tokens_match(token, &expected) && actor.is_none() {
            actor = Some(Actor::for_user(&user));
        }
    }
    Ok(actor)
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// The caller of a request, if it authenticated.
///
/// Missing or unknown tokens yield `Caller(None)`; the policy check then
/// reports 401.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Option<Actor>);

impl Caller {
    /// Any authenticated caller.
    pub fn require(&self) -> Result<Actor, HireError> {
        self.0.ok_or(HireError::Unauthenticated)
    }

    /// Check the caller against the policy matrix.
    pub fn authorize(&self, action: Action, resource: Resource) -> Result<Actor, HireError> {
        let result = authorize(self.0.as_ref(), action, resource);
        if let Err(HireError::Forbidden(reason)) = &result {
            tracing::warn!(
                event = "authz_denied",
                action = %action,
                resource = %resource,
                reason = %reason,
                "Authorization denied"
            );
        }
        result
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                path = %parts.uri.path(),
                "Missing Authorization header"
            );
            return Ok(Self(None));
        };

        let actor = resolve_actor(&state.store, state.settings.admin_token.as_deref(), token)?;
        if actor.is_none() {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_token",
                path = %parts.uri.path(),
                "Authentication failed: unknown token"
            );
        }
        Ok(Self(actor))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use hiretrack_core::{Role, UserInput};

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "abc124"));
        assert!(!tokens_match("abc", "abc123"));
        assert!(!tokens_match("", "abc"));
    }

    #[test]
    fn bearer_prefix_is_optional() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(bearer_token(&headers), Some("tok"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("tok"));
        assert_eq!(bearer_token(&headers), Some("tok"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn resolves_users_and_bootstrap_admin() {
        let store = Store::in_memory().expect("store");
        let (user, token) = store
            .create_user(UserInput {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                role: Role::Interviewer,
            })
            .expect("user");

        let actor = resolve_actor(&store, Some("root"), &token).expect("resolve");
        assert_eq!(actor, Some(Actor::for_user(&user)));

        let admin = resolve_actor(&store, Some("root"), "root").expect("resolve");
        assert_eq!(admin, Some(Actor::bootstrap_admin()));

        assert_eq!(resolve_actor(&store, None, "root").expect("resolve"), None);
    }
}
