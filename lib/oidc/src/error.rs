//! Request-time error types for the authentication gate.
//!
//! Configuration problems surface at construction as
//! [`ConfigError`](gatehouse_identity::ConfigError); everything here can only
//! happen while a request is in flight. The `IntoResponse` impl converts
//! infrastructure failures to generic responses after logging the detail, so
//! provider internals never leak to the end user.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Why a presented identity token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The token was valid once but has expired.
    Expired,
    /// The token failed verification for any other reason: bad signature,
    /// wrong issuer or audience, disallowed signing algorithm, or a
    /// malformed token.
    Invalid { reason: String },
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "identity token has expired"),
            Self::Invalid { reason } => write!(f, "identity token rejected: {reason}"),
        }
    }
}

impl std::error::Error for VerificationError {}

/// Failures from the identity-provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider metadata could not be fetched or was malformed.
    Discovery { reason: String },
    /// The provider rejected the authorization code (expired, reused, or
    /// issued for a different redirect URI).
    Exchange { reason: String },
    /// The code exchange succeeded but the response carried no identity
    /// token, which points at a misconfigured scope set.
    MissingIdentityToken,
    /// The identity token failed verification.
    Verification(VerificationError),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery { reason } => {
                write!(f, "provider discovery failed: {reason}")
            }
            Self::Exchange { reason } => {
                write!(f, "authorization code exchange failed: {reason}")
            }
            Self::MissingIdentityToken => {
                write!(f, "token exchange returned no identity token")
            }
            Self::Verification(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Verification(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VerificationError> for ProviderError {
    fn from(err: VerificationError) -> Self {
        Self::Verification(err)
    }
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Discovery { reason } => {
                tracing::error!("provider discovery failed: {reason}");
                (StatusCode::INTERNAL_SERVER_ERROR, "authentication failed")
            }
            Self::Exchange { reason } => {
                tracing::error!("authorization code exchange failed: {reason}");
                (StatusCode::INTERNAL_SERVER_ERROR, "authentication failed")
            }
            Self::MissingIdentityToken => {
                tracing::error!("token exchange returned no identity token");
                (StatusCode::INTERNAL_SERVER_ERROR, "authentication failed")
            }
            Self::Verification(err) => {
                tracing::warn!("identity token rejected: {err}");
                (StatusCode::UNAUTHORIZED, "invalid credential")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_error_expired_display() {
        let err = VerificationError::Expired;
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn verification_error_invalid_display() {
        let err = VerificationError::Invalid {
            reason: "signature mismatch".to_string(),
        };
        assert!(err.to_string().contains("rejected"));
        assert!(err.to_string().contains("signature mismatch"));
    }

    #[test]
    fn provider_error_discovery_display() {
        let err = ProviderError::Discovery {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("discovery failed"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn provider_error_wraps_verification() {
        let err = ProviderError::from(VerificationError::Expired);
        assert_eq!(err, ProviderError::Verification(VerificationError::Expired));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn infrastructure_errors_convert_to_server_error() {
        let response = ProviderError::Exchange {
            reason: "code reused".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn verification_errors_convert_to_unauthorized() {
        let response = ProviderError::Verification(VerificationError::Invalid {
            reason: "wrong audience".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
