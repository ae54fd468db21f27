//! Identity-provider client: discovery, code exchange, and token
//! verification via the `openidconnect` crate.

use crate::error::{ProviderError, VerificationError};
use async_trait::async_trait;
use gatehouse_identity::{ConfigError, GateConfig, IdentityClaims, VerifiedIdentity};
use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreIdToken, CoreIdTokenClaims, CoreJwsSigningAlgorithm,
    CoreProviderMetadata,
};
use openidconnect::{
    AuthorizationCode, ClaimsVerificationError, ClientId, ClientSecret, CsrfToken, IssuerUrl,
    Nonce, RedirectUrl, Scope, TokenResponse,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The three provider capabilities the gate depends on.
///
/// The production implementation is [`OidcProvider`]; tests substitute stubs
/// to exercise the gate without a network.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Builds the provider's authorization URL carrying the configured
    /// scopes and the given login state.
    async fn authorization_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Exchanges an authorization code for tokens, extracts the identity
    /// token, and verifies it.
    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity, ProviderError>;

    /// Verifies a presented bearer credential as an identity token.
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, ProviderError>;
}

/// `openidconnect`-backed provider client.
///
/// Provider metadata is discovered on first use and cached for the process
/// lifetime: concurrent first callers coalesce on the cell, so exactly one
/// discovery request is made and every caller observes the same metadata.
/// Signing keys and endpoints are assumed stable once discovered; there is no
/// refresh or rotation handling here.
#[derive(Debug)]
pub struct OidcProvider {
    config: Arc<GateConfig>,
    issuer_url: IssuerUrl,
    redirect_url: RedirectUrl,
    client_id: ClientId,
    client_secret: ClientSecret,
    allowed_algs: Vec<CoreJwsSigningAlgorithm>,
    http_client: reqwest::Client,
    metadata: OnceCell<CoreProviderMetadata>,
}

impl OidcProvider {
    /// Creates a provider client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the issuer URL or redirect URI does not
    /// parse, a signing algorithm is not supported, or the HTTP client cannot
    /// be built.
    pub fn new(config: Arc<GateConfig>) -> Result<Self, ConfigError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| ConfigError::new(vec![format!("invalid issuer url: {e}")]))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| ConfigError::new(vec![format!("invalid redirect uri: {e}")]))?;

        let mut allowed_algs = Vec::new();
        let mut unsupported = Vec::new();
        for alg in config.signing_algs() {
            match signing_alg(alg) {
                Some(alg) => allowed_algs.push(alg),
                None => unsupported.push(format!("unsupported signing algorithm: {alg}")),
            }
        }
        if !unsupported.is_empty() {
            return Err(ConfigError::new(unsupported));
        }

        // Redirect-following is disabled: every URL this client fetches was
        // either configured or discovered, never attacker-supplied.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::new(vec![format!("failed to create http client: {e}")]))?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            config,
            issuer_url,
            redirect_url,
            allowed_algs,
            http_client,
            metadata: OnceCell::new(),
        })
    }

    /// Returns the cached provider metadata, discovering it on first use.
    async fn metadata(&self) -> Result<&CoreProviderMetadata, ProviderError> {
        self.metadata
            .get_or_try_init(|| async {
                let metadata = CoreProviderMetadata::discover_async(
                    self.issuer_url.clone(),
                    &self.http_client,
                )
                .await
                .map_err(|e| ProviderError::Discovery {
                    reason: format!("{e}"),
                })?;
                tracing::debug!(issuer = %self.issuer_url, "discovered provider metadata");
                Ok(metadata)
            })
            .await
    }

    fn identity_from_claims(&self, claims: &CoreIdTokenClaims, token: String) -> VerifiedIdentity {
        let name = claims
            .name()
            .and_then(|name| name.get(None))
            .map(|name| name.as_str().to_string())
            .or_else(|| {
                claims
                    .preferred_username()
                    .map(|username| username.as_str().to_string())
            });

        let identity_claims = IdentityClaims::new(
            claims.subject().to_string(),
            claims.issuer().to_string(),
            claims
                .audiences()
                .first()
                .map(|audience| audience.as_str().to_string())
                .unwrap_or_default(),
        )
        .with_name(name)
        .with_email(
            claims.email().map(|email| email.as_str().to_string()),
            claims.email_verified(),
        )
        .with_phone_number(
            claims.phone_number().map(|number| number.as_str().to_string()),
            claims.phone_number_verified(),
        )
        .with_expires_at(Some(claims.expiration()));

        VerifiedIdentity::new(identity_claims, token)
    }
}

#[async_trait]
impl Provider for OidcProvider {
    async fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        let metadata = self.metadata().await?;

        let client = CoreClient::from_provider_metadata(
            metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let state = state.to_string();
        let mut request = client.authorize_url(
            CoreAuthenticationFlow::AuthorizationCode,
            move || CsrfToken::new(state),
            Nonce::new_random,
        );

        // authorize_url already requests the openid scope.
        for scope in self.config.scopes() {
            if scope != "openid" {
                request = request.add_scope(Scope::new(scope.to_string()));
            }
        }

        let (url, _state, _nonce) = request.url();
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<VerifiedIdentity, ProviderError> {
        let metadata = self.metadata().await?;

        let client = CoreClient::from_provider_metadata(
            metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| ProviderError::Exchange {
                reason: format!("token endpoint error: {e}"),
            })?
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::Exchange {
                reason: format!("{e}"),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or(ProviderError::MissingIdentityToken)?;

        let verifier = client
            .id_token_verifier()
            .set_allowed_algs(self.allowed_algs.clone());
        let claims = id_token
            .claims(&verifier, accept_any_nonce)
            .map_err(|e| ProviderError::Verification(verification_error(&e)))?;

        let raw_token = raw_id_token(&token_response)?;
        Ok(self.identity_from_claims(claims, raw_token))
    }

    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, ProviderError> {
        let metadata = self.metadata().await?;

        let client = CoreClient::from_provider_metadata(
            metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let id_token = CoreIdToken::from_str(credential).map_err(|e| {
            ProviderError::Verification(VerificationError::Invalid {
                reason: format!("malformed identity token: {e}"),
            })
        })?;

        let verifier = client
            .id_token_verifier()
            .set_allowed_algs(self.allowed_algs.clone());
        let claims = id_token
            .claims(&verifier, accept_any_nonce)
            .map_err(|e| ProviderError::Verification(verification_error(&e)))?;

        Ok(self.identity_from_claims(claims, credential.to_string()))
    }
}

/// Nonce check used when verifying tokens presented via header or cookie:
/// no login transaction is tracked for them, so any nonce is accepted.
fn accept_any_nonce(_nonce: Option<&Nonce>) -> Result<(), String> {
    Ok(())
}

fn verification_error(err: &ClaimsVerificationError) -> VerificationError {
    match err {
        ClaimsVerificationError::Expired(_) => VerificationError::Expired,
        other => VerificationError::Invalid {
            reason: format!("{other}"),
        },
    }
}

/// Recovers the raw identity-token string from a token response by
/// serializing it; the compact JWT is the serde representation of the
/// `id_token` field.
fn raw_id_token<TR>(token_response: &TR) -> Result<String, ProviderError>
where
    TR: serde::Serialize,
{
    let response_json =
        serde_json::to_value(token_response).map_err(|e| ProviderError::Exchange {
            reason: format!("failed to serialize token response: {e}"),
        })?;

    response_json
        .get("id_token")
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or(ProviderError::MissingIdentityToken)
}

fn signing_alg(name: &str) -> Option<CoreJwsSigningAlgorithm> {
    match name {
        "HS256" => Some(CoreJwsSigningAlgorithm::HmacSha256),
        "HS384" => Some(CoreJwsSigningAlgorithm::HmacSha384),
        "HS512" => Some(CoreJwsSigningAlgorithm::HmacSha512),
        "RS256" => Some(CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha256),
        "RS384" => Some(CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha384),
        "RS512" => Some(CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha512),
        "PS256" => Some(CoreJwsSigningAlgorithm::RsaSsaPssSha256),
        "PS384" => Some(CoreJwsSigningAlgorithm::RsaSsaPssSha384),
        "PS512" => Some(CoreJwsSigningAlgorithm::RsaSsaPssSha512),
        "ES256" => Some(CoreJwsSigningAlgorithm::EcdsaP256Sha256),
        "ES384" => Some(CoreJwsSigningAlgorithm::EcdsaP384Sha384),
        "ES512" => Some(CoreJwsSigningAlgorithm::EcdsaP521Sha512),
        _ => None,
    }
}
