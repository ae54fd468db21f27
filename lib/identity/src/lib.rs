//! Identity domain types for the gatehouse authentication middleware.
//!
//! This crate provides:
//! - Provider configuration (`GateConfig`) with defaulting and validation
//! - Verified identity claims (`IdentityClaims`, `VerifiedIdentity`)
//! - The construction-time configuration error (`ConfigError`)
//!
//! It carries no HTTP dependencies; the middleware crate builds on top of it.
//!
//! # Example
//!
//! ```
//! use gatehouse_identity::GateConfig;
//!
//! let config = GateConfig::new(
//!     "https://auth.example.com/realms/main".to_string(),
//!     "my-client".to_string(),
//!     "my-secret".to_string(),
//!     "https://app.example.com/auth/callback".to_string(),
//! )
//! .with_defaults();
//!
//! config.validate().expect("configuration is valid");
//! assert_eq!(config.callback_path(), Some("/auth/callback"));
//! ```

pub mod claims;
pub mod config;
pub mod error;

// Re-export main types at crate root
pub use claims::{IdentityClaims, VerifiedIdentity};
pub use config::{GateConfig, GateConfigBuilder};
pub use error::ConfigError;
