//! Binding the verified identity to the request for downstream handlers.
//!
//! The identity is stored in the request extensions under a crate-private
//! newtype, so no caller-inserted extension can collide with it and nothing
//! outside this crate can overwrite it. Downstream handlers read it through
//! the [`Identity`] and [`OptionalIdentity`] extractors or through
//! [`verified_identity`].

use axum::extract::FromRequestParts;
use axum::http::{Extensions, StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use gatehouse_identity::VerifiedIdentity;
use std::convert::Infallible;
use std::sync::Arc;

/// Private extension key: unnameable outside this crate.
#[derive(Clone)]
struct BoundIdentity(Arc<VerifiedIdentity>);

/// Associates a verified identity with the request.
pub(crate) fn bind(extensions: &mut Extensions, identity: VerifiedIdentity) {
    extensions.insert(BoundIdentity(Arc::new(identity)));
}

/// Returns the identity bound to the request, if any.
///
/// Absent means the request was not authenticated: either the route was
/// unprotected and carried no valid credential, or no gate ran at all.
#[must_use]
pub fn verified_identity(extensions: &Extensions) -> Option<Arc<VerifiedIdentity>> {
    extensions
        .get::<BoundIdentity>()
        .map(|bound| Arc::clone(&bound.0))
}

/// Extractor for handlers that require an authenticated caller.
///
/// Rejects with 401 when no identity was bound. Behind the gate's protected
/// routes the rejection is unreachable; it exists for handlers mounted
/// outside the gate.
pub struct Identity(pub Arc<VerifiedIdentity>);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = IdentityRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        verified_identity(&parts.extensions)
            .map(Identity)
            .ok_or(IdentityRejection)
    }
}

/// Extractor for handlers that can serve both authenticated and anonymous
/// callers. Never rejects.
pub struct OptionalIdentity(pub Option<Arc<VerifiedIdentity>>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(verified_identity(&parts.extensions)))
    }
}

/// Rejection for the [`Identity`] extractor.
#[derive(Debug)]
pub struct IdentityRejection;

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "not authenticated").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_identity::IdentityClaims;

    fn identity() -> VerifiedIdentity {
        VerifiedIdentity::new(
            IdentityClaims::new(
                "sub_123".to_string(),
                "https://auth.example.com".to_string(),
                "client-id".to_string(),
            ),
            "raw.jwt.token".to_string(),
        )
    }

    #[test]
    fn bind_then_read_round_trips() {
        let mut extensions = Extensions::new();
        bind(&mut extensions, identity());

        let bound = verified_identity(&extensions).expect("identity should be bound");
        assert_eq!(bound.subject(), "sub_123");
    }

    #[test]
    fn read_without_bind_is_absent() {
        let extensions = Extensions::new();
        assert!(verified_identity(&extensions).is_none());
    }

    #[test]
    fn caller_extensions_do_not_collide() {
        let mut extensions = Extensions::new();
        extensions.insert(Arc::new(identity()));

        assert!(verified_identity(&extensions).is_none());
    }

    #[tokio::test]
    async fn identity_extractor_rejects_unauthenticated() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/protected")
            .body(())
            .expect("build request")
            .into_parts();

        let result = Identity::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn optional_extractor_never_rejects() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/anywhere")
            .body(())
            .expect("build request")
            .into_parts();

        let OptionalIdentity(found) = OptionalIdentity::from_request_parts(&mut parts, &())
            .await
            .expect("infallible");
        assert!(found.is_none());
    }
}
