//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`GateConfig`](gatehouse_identity::GateConfig) for the identity
//! provider configuration.

use gatehouse_identity::GateConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Identity provider configuration for the authentication gate.
    pub gate: GateConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_addr_has_a_default() {
        let json = r#"{
            "gate": {
                "issuer_url": "https://auth.example.com",
                "client_id": "my-client",
                "client_secret": "secret",
                "redirect_uri": "https://app.example.com/auth/callback"
            }
        }"#;

        let config: ServerConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.gate.issuer_url(), "https://auth.example.com");
    }
}
