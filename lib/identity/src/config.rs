//! Gate configuration for connecting to an OpenID Connect identity provider.
//!
//! The configuration is constructed once at startup, defaulted with
//! [`GateConfig::with_defaults`], checked with [`GateConfig::validate`], and
//! read-only afterwards. Validation reports every violated invariant at once
//! so a misconfigured deployment can fix everything in one pass.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the OIDC identity provider the gate authenticates
/// against.
///
/// Works with any spec-compliant provider (e.g. Keycloak, Auth0, Authentik).
/// Fields with defaults can be omitted when loading from environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// The OIDC issuer URL (e.g. "https://auth.example.com/realms/main").
    /// Used for OIDC discovery.
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The fully-qualified redirect URI for the OAuth2 callback
    /// (e.g. "https://app.example.com/auth/callback").
    redirect_uri: String,
    /// The request path that triggers callback handling. Must match the path
    /// of `redirect_uri`; derived from it when left unset.
    #[serde(default)]
    callback_path: Option<String>,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Accepted identity-token signing algorithms as a comma-separated
    /// string. Default: "RS256,RS512"
    #[serde(default = "default_signing_algs")]
    signing_algs: String,
    /// If set, the verified identity token is also written to (and read back
    /// from) a cookie of this name.
    #[serde(default)]
    cookie_name: Option<String>,
    /// Whether to set the Secure flag on the identity cookie (requires
    /// HTTPS). Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    secure_cookies: bool,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_signing_algs() -> String {
    "RS256,RS512".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

impl GateConfig {
    /// Creates a new configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            callback_path: None,
            scopes: default_scopes(),
            signing_algs: default_signing_algs(),
            cookie_name: None,
            secure_cookies: default_secure_cookies(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> GateConfigBuilder {
        GateConfigBuilder::new(issuer_url, client_id, client_secret, redirect_uri)
    }

    /// Fills unset optional fields without overwriting caller-supplied
    /// values. Idempotent.
    ///
    /// The callback path is derived from the path of the redirect URI when
    /// left unset; empty scope and algorithm lists fall back to their
    /// defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.scopes.trim().is_empty() {
            self.scopes = default_scopes();
        }
        if self.signing_algs.trim().is_empty() {
            self.signing_algs = default_signing_algs();
        }
        let callback_unset = self
            .callback_path
            .as_ref()
            .is_none_or(|path| path.is_empty());
        if callback_unset && !self.redirect_uri.is_empty() {
            if let Ok(uri) = url::Url::parse(&self.redirect_uri) {
                self.callback_path = Some(uri.path().to_string());
            }
        }
        self
    }

    /// Checks every construction-time invariant, reporting all violations at
    /// once rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] listing each problem: a missing issuer URL,
    /// client id, client secret, or redirect URI, and a callback path that is
    /// unset, does not end the redirect URI, or does not start with a slash.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.issuer_url.is_empty() {
            problems.push("issuer url must be specified".to_string());
        }
        if self.client_id.is_empty() {
            problems.push("client id must be specified".to_string());
        }
        if self.client_secret.is_empty() {
            problems.push("client secret must be specified".to_string());
        }
        if self.redirect_uri.is_empty() {
            problems.push("redirect uri must be specified".to_string());
        }

        match self.callback_path.as_deref() {
            None | Some("") => {
                problems.push("callback path must be specified".to_string());
            }
            Some(path) => {
                if !self.redirect_uri.ends_with(path) {
                    problems.push("callback path must match the redirect uri".to_string());
                }
                if !path.starts_with('/') {
                    problems.push(format!("callback path must start with a slash: {path}"));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(problems))
        }
    }

    /// Returns the OIDC issuer URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the callback path, if set or derived.
    #[must_use]
    pub fn callback_path(&self) -> Option<&str> {
        self.callback_path.as_deref().filter(|path| !path.is_empty())
    }

    /// Returns the OAuth2 scopes to request, parsed from the comma-separated
    /// string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|scope| !scope.is_empty())
            .collect()
    }

    /// Returns the raw scopes string.
    #[must_use]
    pub fn scopes_raw(&self) -> &str {
        &self.scopes
    }

    /// Returns the accepted signing algorithms, parsed from the
    /// comma-separated string.
    #[must_use]
    pub fn signing_algs(&self) -> Vec<&str> {
        self.signing_algs
            .split(',')
            .map(str::trim)
            .filter(|alg| !alg.is_empty())
            .collect()
    }

    /// Returns the identity-cookie name, if configured and non-empty.
    #[must_use]
    pub fn cookie_name(&self) -> Option<&str> {
        self.cookie_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns whether the identity cookie carries the Secure flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

/// Builder for [`GateConfig`].
#[derive(Debug)]
pub struct GateConfigBuilder {
    issuer_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    callback_path: Option<String>,
    scopes: Vec<String>,
    signing_algs: Vec<String>,
    cookie_name: Option<String>,
    secure_cookies: bool,
}

impl GateConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            callback_path: None,
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            signing_algs: vec!["RS256".to_string(), "RS512".to_string()],
            cookie_name: None,
            secure_cookies: default_secure_cookies(),
        }
    }

    /// Sets the callback path (overriding derivation from the redirect URI).
    #[must_use]
    pub fn callback_path(mut self, path: String) -> Self {
        self.callback_path = Some(path);
        self
    }

    /// Sets the OAuth2 scopes to request.
    #[must_use]
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Adds a scope to the list of scopes to request.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Sets the accepted identity-token signing algorithms.
    #[must_use]
    pub fn signing_algs(mut self, algs: Vec<String>) -> Self {
        self.signing_algs = algs;
        self
    }

    /// Sets the identity-cookie name.
    #[must_use]
    pub fn cookie_name(mut self, name: String) -> Self {
        self.cookie_name = Some(name);
        self
    }

    /// Sets whether the identity cookie carries the Secure flag.
    #[must_use]
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Builds the [`GateConfig`].
    #[must_use]
    pub fn build(self) -> GateConfig {
        GateConfig {
            issuer_url: self.issuer_url,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            callback_path: self.callback_path,
            scopes: self.scopes.join(","),
            signing_algs: self.signing_algs.join(","),
            cookie_name: self.cookie_name,
            secure_cookies: self.secure_cookies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> GateConfig {
        GateConfig::new(
            "https://auth.example.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/callback".to_string(),
        )
    }

    #[test]
    fn new_config_has_defaults() {
        let config = base_config();

        assert_eq!(config.issuer_url(), "https://auth.example.com");
        assert_eq!(config.client_id(), "client-id");
        assert_eq!(config.client_secret(), "client-secret");
        assert_eq!(
            config.redirect_uri(),
            "https://app.example.com/auth/callback"
        );
        assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
        assert_eq!(config.signing_algs(), vec!["RS256", "RS512"]);
        assert_eq!(config.callback_path(), None);
        assert_eq!(config.cookie_name(), None);
        assert!(config.secure_cookies());
    }

    #[test]
    fn with_defaults_derives_callback_path() {
        let config = base_config().with_defaults();
        assert_eq!(config.callback_path(), Some("/auth/callback"));
    }

    #[test]
    fn with_defaults_keeps_explicit_callback_path() {
        let config = GateConfig::builder(
            "https://auth.example.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/callback".to_string(),
        )
        .callback_path("/custom/callback".to_string())
        .build()
        .with_defaults();

        assert_eq!(config.callback_path(), Some("/custom/callback"));
    }

    #[test]
    fn with_defaults_is_idempotent() {
        let once = base_config().with_defaults();
        let twice = once.clone().with_defaults();

        assert_eq!(once.callback_path(), twice.callback_path());
        assert_eq!(once.scopes(), twice.scopes());
        assert_eq!(once.signing_algs(), twice.signing_algs());
    }

    #[test]
    fn validate_accepts_defaulted_config() {
        let config = base_config().with_defaults();
        config.validate().expect("config should be valid");
    }

    #[test]
    fn validate_reports_all_problems_at_once() {
        let config = GateConfig::new(
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        );

        let err = config.validate().expect_err("config should be invalid");
        assert_eq!(err.problems().len(), 5);
        assert!(err.to_string().contains("issuer url"));
        assert!(err.to_string().contains("client id"));
        assert!(err.to_string().contains("client secret"));
        assert!(err.to_string().contains("redirect uri"));
        assert!(err.to_string().contains("callback path"));
    }

    #[test]
    fn validate_rejects_mismatched_callback_path() {
        let config = GateConfig::builder(
            "https://auth.example.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/callback".to_string(),
        )
        .callback_path("/elsewhere".to_string())
        .build();

        let err = config.validate().expect_err("config should be invalid");
        assert!(err.to_string().contains("must match the redirect uri"));
    }

    #[test]
    fn validate_rejects_callback_path_without_slash() {
        let config = GateConfig::builder(
            "https://auth.example.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/callback".to_string(),
        )
        .callback_path("auth/callback".to_string())
        .build();

        let err = config.validate().expect_err("config should be invalid");
        assert!(err.to_string().contains("start with a slash"));
    }

    #[test]
    fn builder_allows_customization() {
        let config = GateConfig::builder(
            "https://auth.example.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/callback".to_string(),
        )
        .add_scope("groups".to_string())
        .signing_algs(vec!["ES256".to_string()])
        .cookie_name("gatehouse_id".to_string())
        .secure_cookies(false)
        .build();

        assert!(config.scopes().contains(&"groups"));
        assert_eq!(config.signing_algs(), vec!["ES256"]);
        assert_eq!(config.cookie_name(), Some("gatehouse_id"));
        assert!(!config.secure_cookies());
    }

    #[test]
    fn builder_add_scope_does_not_duplicate() {
        let config = GateConfig::builder(
            "https://auth.example.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/auth/callback".to_string(),
        )
        .add_scope("openid".to_string()) // Already present
        .add_scope("custom".to_string())
        .build();

        let openid_count = config.scopes().iter().filter(|s| *s == &"openid").count();
        assert_eq!(openid_count, 1);
        assert!(config.scopes().contains(&"custom"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "issuer_url": "https://auth.example.com",
            "client_id": "my-client",
            "client_secret": "secret",
            "redirect_uri": "https://app.example.com/callback"
        }"#;

        let config: GateConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.issuer_url(), "https://auth.example.com");
        assert_eq!(config.client_id(), "my-client");
        assert_eq!(config.scopes(), vec!["openid", "email", "profile"]);
        assert_eq!(config.signing_algs(), vec!["RS256", "RS512"]);
        assert_eq!(config.cookie_name(), None);
        assert!(config.secure_cookies());
    }

    #[test]
    fn scopes_parse_comma_separated() {
        let json = r#"{
            "issuer_url": "https://auth.example.com",
            "client_id": "my-client",
            "client_secret": "secret",
            "redirect_uri": "https://app.example.com/callback",
            "scopes": "openid, email, profile, groups"
        }"#;

        let config: GateConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.scopes(), vec!["openid", "email", "profile", "groups"]);
    }

    #[test]
    fn empty_cookie_name_reads_as_unset() {
        let json = r#"{
            "issuer_url": "https://auth.example.com",
            "client_id": "my-client",
            "client_secret": "secret",
            "redirect_uri": "https://app.example.com/callback",
            "cookie_name": ""
        }"#;

        let config: GateConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.cookie_name(), None);
    }
}
