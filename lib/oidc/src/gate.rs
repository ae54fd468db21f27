//! The authentication gate: per-request classification and enforcement.
//!
//! Each request is classified as exactly one of unprotected, callback, or
//! protected, and handled by the matching protocol:
//!
//! - **Unprotected** (route guard opted the route out): any presented
//!   credential is verified best-effort and bound on success; failures are
//!   swallowed and the request always continues.
//! - **Callback** (path equals the configured callback path): the
//!   authorization code is exchanged and verified, the identity cookie is set
//!   when configured, and the login-success hook finishes the response.
//! - **Protected** (everything else): a missing credential triggers the
//!   login redirect; an expired one triggers the same redirect (silent
//!   re-authentication); any other verification failure gets the
//!   unauthorized response; a valid one is bound and the request continues.

use crate::context;
use crate::error::{ProviderError, VerificationError};
use crate::extract::bearer_token;
use crate::provider::{OidcProvider, Provider};
use crate::state::{
    BearerChallengeResponder, LoginStateEncoder, LoginSuccessHandler, PathStateEncoder,
    RedirectSuccessHandler, RouteGuard, UnauthorizedResponder,
};
use axum::body::Body;
use axum::extract::{Query, Request};
use axum::http::{StatusCode, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use gatehouse_identity::{ConfigError, GateConfig};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters the identity provider sends to the callback.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: String,
    #[serde(default)]
    state: String,
}

/// The authentication gate.
///
/// Construct one per identity provider with [`OidcGate::builder`], wrap it in
/// an `Arc`, and mount [`OidcGate::handle`] as middleware over the routes it
/// should guard. Handlers behind the gate read the identity through the
/// [`Identity`](crate::context::Identity) extractor.
pub struct OidcGate {
    config: Arc<GateConfig>,
    provider: Arc<dyn Provider>,
    unauthorized: Arc<dyn UnauthorizedResponder>,
    state_encoder: Arc<dyn LoginStateEncoder>,
    login_success: Arc<dyn LoginSuccessHandler>,
    route_guard: Option<Arc<dyn RouteGuard>>,
}

impl OidcGate {
    /// Creates a builder for a gate using the given provider configuration.
    #[must_use]
    pub fn builder(config: GateConfig) -> OidcGateBuilder {
        OidcGateBuilder {
            config,
            provider: None,
            unauthorized: None,
            state_encoder: None,
            login_success: None,
            route_guard: None,
        }
    }

    /// Whole-application protector for `axum::middleware::from_fn`:
    /// classifies the request and runs the matching protocol.
    ///
    /// The route guard is consulted first; when it declares the route
    /// unprotected, neither the callback nor the protected protocol runs.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let (parts, body) = request.into_parts();

        if let Some(guard) = &self.route_guard {
            if !guard.is_protected(&parts) {
                return self.pass_through(parts, body, next).await;
            }
        }

        if self.is_callback(&parts) {
            return self.finish_login(parts).await;
        }

        self.enforce(parts, body, next).await
    }

    /// Per-route protector: enforces authentication on exactly the routes it
    /// is layered over, without callback handling or guard classification.
    pub async fn protect(&self, request: Request, next: Next) -> Response {
        let (parts, body) = request.into_parts();
        self.enforce(parts, body, next).await
    }

    /// Standalone callback handler, for mounting directly on the callback
    /// route instead of relying on [`OidcGate::handle`]'s path match.
    pub async fn callback(&self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();
        self.finish_login(parts).await
    }

    fn is_callback(&self, parts: &Parts) -> bool {
        self.config
            .callback_path()
            .is_some_and(|path| parts.uri.path() == path)
    }

    /// Unprotected protocol: verify opportunistically, continue regardless.
    async fn pass_through(&self, mut parts: Parts, body: Body, next: Next) -> Response {
        let credential = bearer_token(&parts.headers, self.config.cookie_name());
        if let Some(credential) = credential.filter(|credential| !credential.is_empty()) {
            match self.provider.verify(&credential).await {
                Ok(identity) => context::bind(&mut parts.extensions, identity),
                Err(error) => {
                    tracing::debug!("ignoring credential on unprotected route: {error}");
                }
            }
        }

        next.run(Request::from_parts(parts, body)).await
    }

    /// Protected protocol.
    async fn enforce(&self, mut parts: Parts, body: Body, next: Next) -> Response {
        let credential = bearer_token(&parts.headers, self.config.cookie_name())
            .filter(|credential| !credential.is_empty());

        let Some(credential) = credential else {
            return self.login_redirect(&parts).await;
        };

        match self.provider.verify(&credential).await {
            Ok(identity) => {
                tracing::debug!(subject = identity.subject(), "authenticated request");
                context::bind(&mut parts.extensions, identity);
                next.run(Request::from_parts(parts, body)).await
            }
            Err(ProviderError::Verification(VerificationError::Expired)) => {
                tracing::debug!("credential expired, redirecting to identity provider");
                self.login_redirect(&parts).await
            }
            Err(ProviderError::Verification(error)) => {
                tracing::warn!("rejecting credential: {error}");
                self.unauthorized.respond(&parts).await
            }
            Err(error) => error.into_response(),
        }
    }

    /// Encodes the login state and redirects to the provider's authorization
    /// endpoint. Request processing ends here.
    async fn login_redirect(&self, parts: &Parts) -> Response {
        let state = match self.state_encoder.encode(parts) {
            Ok(state) => state,
            Err(error) => {
                tracing::error!("failed to encode login state: {error}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        match self.provider.authorization_url(&state).await {
            Ok(url) => Redirect::to(&url).into_response(),
            Err(error) => error.into_response(),
        }
    }

    /// Callback protocol: exchange the code, set the identity cookie when
    /// configured, and hand the response to the login-success hook.
    async fn finish_login(&self, parts: Parts) -> Response {
        let query = match Query::<CallbackQuery>::try_from_uri(&parts.uri) {
            Ok(Query(query)) => query,
            Err(rejection) => {
                tracing::warn!("malformed callback query: {rejection}");
                return (StatusCode::BAD_REQUEST, "missing authorization code").into_response();
            }
        };

        let identity = match self.provider.exchange_code(&query.code).await {
            Ok(identity) => identity,
            Err(error) => return error.into_response(),
        };
        tracing::info!(subject = identity.subject(), "login completed");

        let jar = self.config.cookie_name().map(|name| {
            let cookie = Cookie::build((name.to_string(), identity.token().to_string()))
                .path("/")
                .http_only(true)
                .secure(self.config.secure_cookies())
                .same_site(SameSite::Lax);
            CookieJar::new().add(cookie)
        });

        let response = self.login_success.on_login(&query.state, &identity).await;
        match jar {
            Some(jar) => (jar, response).into_response(),
            None => response,
        }
    }
}

/// Builder for [`OidcGate`].
///
/// Unset hooks fall back to the defaults: path-based state encoding, a
/// redirect-to-state success handler, and a 401 bearer challenge. Without a
/// route guard every route is protected; without an injected provider the
/// `openidconnect`-backed [`OidcProvider`] is constructed from the
/// configuration.
pub struct OidcGateBuilder {
    config: GateConfig,
    provider: Option<Arc<dyn Provider>>,
    unauthorized: Option<Arc<dyn UnauthorizedResponder>>,
    state_encoder: Option<Arc<dyn LoginStateEncoder>>,
    login_success: Option<Arc<dyn LoginSuccessHandler>>,
    route_guard: Option<Arc<dyn RouteGuard>>,
}

impl OidcGateBuilder {
    /// Substitutes the provider client.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Substitutes the unauthorized responder.
    #[must_use]
    pub fn unauthorized_responder(
        mut self,
        responder: impl UnauthorizedResponder + 'static,
    ) -> Self {
        self.unauthorized = Some(Arc::new(responder));
        self
    }

    /// Substitutes the login-state encoder. Pair with a matching
    /// success handler.
    #[must_use]
    pub fn state_encoder(mut self, encoder: impl LoginStateEncoder + 'static) -> Self {
        self.state_encoder = Some(Arc::new(encoder));
        self
    }

    /// Substitutes the login-success handler. Pair with a matching
    /// state encoder.
    #[must_use]
    pub fn login_success_handler(mut self, handler: impl LoginSuccessHandler + 'static) -> Self {
        self.login_success = Some(Arc::new(handler));
        self
    }

    /// Sets the route-protection predicate.
    #[must_use]
    pub fn route_guard(mut self, guard: impl RouteGuard + 'static) -> Self {
        self.route_guard = Some(Arc::new(guard));
        self
    }

    /// Defaults and validates the configuration, then builds the gate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is invalid; the gate
    /// never fails for configuration reasons at request time.
    pub fn build(self) -> Result<OidcGate, ConfigError> {
        let config = self.config.with_defaults();
        config.validate()?;
        let config = Arc::new(config);

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(OidcProvider::new(Arc::clone(&config))?),
        };

        Ok(OidcGate {
            config,
            provider,
            unauthorized: self
                .unauthorized
                .unwrap_or_else(|| Arc::new(BearerChallengeResponder)),
            state_encoder: self
                .state_encoder
                .unwrap_or_else(|| Arc::new(PathStateEncoder)),
            login_success: self
                .login_success
                .unwrap_or_else(|| Arc::new(RedirectSuccessHandler)),
            route_guard: self.route_guard,
        })
    }
}
