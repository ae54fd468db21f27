//! Reference server for the gatehouse OIDC middleware.
//!
//! Everything except `/` and `/healthz` requires a logged-in caller; `/me`
//! echoes the claims of the verified identity bound by the gate.

mod config;

use axum::http::request::Parts;
use axum::routing::get;
use axum::{Json, Router, middleware};
use config::ServerConfig;
use gatehouse_identity::IdentityClaims;
use gatehouse_oidc::{Identity, OidcGate};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let gate = OidcGate::builder(config.gate)
        .route_guard(|parts: &Parts| !matches!(parts.uri.path(), "/" | "/healthz"))
        .build()
        .expect("invalid gate configuration");
    let gate = Arc::new(gate);

    let app = Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/me", get(me))
        .layer(middleware::from_fn(move |req, next| {
            let gate = gate.clone();
            async move { gate.handle(req, next).await }
        }))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!(addr = %config.listen_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn index() -> &'static str {
    "gatehouse reference server"
}

async fn healthz() -> &'static str {
    "ok"
}

/// Echoes the verified identity the gate bound to the request.
async fn me(Identity(identity): Identity) -> Json<IdentityClaims> {
    Json(identity.claims().clone())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("Shutting down");
}
