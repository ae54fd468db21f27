//! OpenID Connect authentication middleware for axum.
//!
//! This crate provides:
//! - `OidcGate`: per-request authentication with a browser-redirect login
//!   flow against an external OIDC provider
//! - Bearer-credential extraction from the `Authorization` header with an
//!   optional cookie fallback
//! - `Identity` / `OptionalIdentity` extractors for downstream handlers
//! - Hook traits for state encoding, login-success handling, unauthorized
//!   responses, and route protection, each with a default implementation
//!
//! Token verification, provider discovery, and the authorization-code
//! exchange are delegated to the `openidconnect` crate; the gate owns the
//! decision procedure around them.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{Router, middleware, routing::get};
//! use gatehouse_identity::GateConfig;
//! use gatehouse_oidc::{Identity, OidcGate};
//! use std::sync::Arc;
//!
//! let config = GateConfig::new(
//!     "https://auth.example.com/realms/main".to_string(),
//!     "my-client".to_string(),
//!     "my-secret".to_string(),
//!     "https://app.example.com/auth/callback".to_string(),
//! );
//! let gate = Arc::new(OidcGate::builder(config).build()?);
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/me",
//!         get(|Identity(identity): Identity| async move {
//!             identity.subject().to_string()
//!         }),
//!     )
//!     .layer(middleware::from_fn(move |req, next| {
//!         let gate = gate.clone();
//!         async move { gate.handle(req, next).await }
//!     }));
//! ```

pub mod context;
pub mod error;
pub mod extract;
pub mod gate;
pub mod provider;
pub mod state;

// Re-export main types at crate root
pub use context::{Identity, IdentityRejection, OptionalIdentity, verified_identity};
pub use error::{ProviderError, VerificationError};
pub use extract::bearer_token;
pub use gate::{OidcGate, OidcGateBuilder};
pub use provider::{OidcProvider, Provider};
pub use state::{
    BearerChallengeResponder, LoginStateEncoder, LoginSuccessHandler, PathStateEncoder,
    RedirectSuccessHandler, RouteGuard, UnauthorizedResponder,
};
