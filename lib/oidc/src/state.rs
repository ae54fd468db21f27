//! Hook capabilities the gate is parameterized over.
//!
//! Each hook is a one-method trait with a default implementation:
//! - [`LoginStateEncoder`] serializes "where the user was going" before the
//!   login redirect (default: the request path).
//! - [`LoginSuccessHandler`] restores application state after the callback
//!   and owns the response (default: redirect to the decoded path).
//! - [`UnauthorizedResponder`] owns the response for rejected credentials
//!   (default: 401 with a bearer challenge).
//! - [`RouteGuard`] declares routes unprotected.
//!
//! Encoder and success handler should be replaced as a pair: whatever the
//! encoder writes is exactly what the handler receives back.

use async_trait::async_trait;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use gatehouse_identity::VerifiedIdentity;

/// Boxed error for fallible hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Serializes application state to round-trip through the identity provider.
///
/// The encoded value travels as the `state` query parameter: it is visible to
/// and modifiable by the user agent, so it must not carry secrets and the
/// paired [`LoginSuccessHandler`] must not trust it.
pub trait LoginStateEncoder: Send + Sync {
    /// Encodes the state to carry across the login redirect.
    ///
    /// # Errors
    ///
    /// An encoding failure aborts the redirect and surfaces as a server
    /// error.
    fn encode(&self, parts: &Parts) -> Result<String, BoxError>;
}

/// Default state encoder: the request path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathStateEncoder;

impl LoginStateEncoder for PathStateEncoder {
    fn encode(&self, parts: &Parts) -> Result<String, BoxError> {
        Ok(parts.uri.path().to_string())
    }
}

/// Completes the response after a successful login callback.
#[async_trait]
pub trait LoginSuccessHandler: Send + Sync {
    /// Receives the state string produced by the paired encoder and the
    /// freshly verified identity, and produces the response that ends the
    /// callback request.
    async fn on_login(&self, state: &str, identity: &VerifiedIdentity) -> Response;
}

/// Default success handler: sends the now-authenticated browser back to the
/// path the state decodes to, or to `/` when the state is empty.
///
/// The state is attacker-controlled, so only local absolute paths are
/// followed; anything else falls back to `/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectSuccessHandler;

#[async_trait]
impl LoginSuccessHandler for RedirectSuccessHandler {
    async fn on_login(&self, state: &str, _identity: &VerifiedIdentity) -> Response {
        Redirect::to(local_redirect_target(state)).into_response()
    }
}

/// Produces the response for a credential that failed verification.
#[async_trait]
pub trait UnauthorizedResponder: Send + Sync {
    /// Builds the not-authorized response.
    async fn respond(&self, parts: &Parts) -> Response;
}

/// Default unauthorized responder: 401 with `WWW-Authenticate: Bearer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerChallengeResponder;

#[async_trait]
impl UnauthorizedResponder for BearerChallengeResponder {
    async fn respond(&self, _parts: &Parts) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
        )
            .into_response()
    }
}

/// Declares whether a route is protected by the gate.
///
/// Routes the guard declares unprotected skip authentication entirely; any
/// credential they carry is still verified opportunistically, but failures
/// never block the request.
pub trait RouteGuard: Send + Sync {
    /// Returns true when the route requires an authenticated caller.
    fn is_protected(&self, parts: &Parts) -> bool;
}

impl<F> RouteGuard for F
where
    F: Fn(&Parts) -> bool + Send + Sync,
{
    fn is_protected(&self, parts: &Parts) -> bool {
        self(parts)
    }
}

/// Clamps a state value to a local absolute path, falling back to `/`.
///
/// Rejects protocol-relative targets (`//host/...`) and anything that is not
/// an absolute path, since the state round-trips through the user agent
/// unsigned.
fn local_redirect_target(state: &str) -> &str {
    if state.is_empty() || !state.starts_with('/') || state.starts_with("//") {
        "/"
    } else {
        state
    }
}
