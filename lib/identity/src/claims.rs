//! Identity claims extracted from a verified identity token.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Claims asserted by the identity provider about an authenticated user.
///
/// The subject, issuer, and audience are always present on a verified token;
/// the profile and contact claims depend on the scopes the provider was asked
/// for and on what it chose to release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityClaims {
    /// The subject claim (unique user identifier at the provider).
    pub subject: String,
    /// The issuer URL the token was minted by.
    pub issuer: String,
    /// The audience the token was minted for (the client id).
    pub audience: String,
    /// Display name (from `name` or `preferred_username`).
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the provider has verified the email address.
    pub email_verified: Option<bool>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Whether the provider has verified the phone number.
    pub phone_number_verified: Option<bool>,
    /// Expiry of the underlying token.
    pub expires_at: Option<DateTime<Utc>>,
}

impl IdentityClaims {
    /// Creates a claim set with the always-present claims.
    #[must_use]
    pub fn new(subject: String, issuer: String, audience: String) -> Self {
        Self {
            subject,
            issuer,
            audience,
            name: None,
            email: None,
            email_verified: None,
            phone_number: None,
            phone_number_verified: None,
            expires_at: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Sets the email claims.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>, verified: Option<bool>) -> Self {
        self.email = email;
        self.email_verified = verified;
        self
    }

    /// Sets the phone claims.
    #[must_use]
    pub fn with_phone_number(mut self, number: Option<String>, verified: Option<bool>) -> Self {
        self.phone_number = number;
        self.phone_number_verified = verified;
        self
    }

    /// Sets the token expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }
}

/// A successfully verified identity: the claim set plus the raw token it was
/// verified from.
///
/// Created by the provider client, bound to the request for downstream
/// handlers, and dropped at the end of the request. The raw token is kept so
/// it can be re-presented later (it is the cookie value when a cookie name is
/// configured).
#[derive(Clone)]
pub struct VerifiedIdentity {
    claims: IdentityClaims,
    token: String,
}

impl VerifiedIdentity {
    /// Pairs a claim set with the raw token it was extracted from.
    #[must_use]
    pub fn new(claims: IdentityClaims, token: String) -> Self {
        Self { claims, token }
    }

    /// Returns the verified claims.
    #[must_use]
    pub fn claims(&self) -> &IdentityClaims {
        &self.claims
    }

    /// Returns the raw identity token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the subject claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.subject
    }
}

impl fmt::Debug for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedIdentity")
            .field("claims", &self.claims)
            .field("token", &"(redacted)")
            .finish()
    }
}
