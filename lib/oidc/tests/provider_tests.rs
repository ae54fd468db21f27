use gatehouse_identity::GateConfig;
use gatehouse_oidc::{OidcProvider, Provider, ProviderError};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_issuer() -> MockServer {
    let server = MockServer::start().await;
    let issuer = server.uri();

    let metadata = serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/authorize"),
        "token_endpoint": format!("{issuer}/token"),
        "jwks_uri": format!("{issuer}/jwks"),
        "response_types_supported": ["code"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": ["RS256"],
    });

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "keys": [] })))
        .mount(&server)
        .await;

    server
}

fn provider_for(issuer: String) -> OidcProvider {
    let config = GateConfig::new(
        issuer,
        "client-id".to_string(),
        "client-secret".to_string(),
        "https://app.example.com/auth/callback".to_string(),
    )
    .with_defaults();

    OidcProvider::new(Arc::new(config)).expect("build provider")
}

#[tokio::test]
async fn concurrent_first_use_discovers_exactly_once() {
    let server = mock_issuer().await;
    let provider = provider_for(server.uri());

    let (first, second) = tokio::join!(
        provider.authorization_url("/a"),
        provider.authorization_url("/b"),
    );

    let first = first.expect("authorization url");
    let second = second.expect("authorization url");

    // Both callers observe the same cached metadata.
    let authorize = format!("{}/authorize?", server.uri());
    assert!(first.starts_with(&authorize));
    assert!(second.starts_with(&authorize));
    assert!(first.contains("state=%2Fa"));
    assert!(second.contains("state=%2Fb"));

    // The discovery mock's expect(1) is verified when the server drops.
}

#[tokio::test]
async fn authorization_url_carries_client_and_scopes() {
    let server = mock_issuer().await;
    let provider = provider_for(server.uri());

    let url = provider
        .authorization_url("/reports")
        .await
        .expect("authorization url");

    assert!(url.contains("client_id=client-id"));
    assert!(url.contains("redirect_uri="));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("scope="));
    assert!(url.contains("email"));
    assert!(url.contains("profile"));
}

#[tokio::test]
async fn discovery_failure_surfaces_as_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = provider_for(server.uri());
    let err = provider
        .authorization_url("/a")
        .await
        .expect_err("discovery should fail");

    assert!(matches!(err, ProviderError::Discovery { .. }));
}
