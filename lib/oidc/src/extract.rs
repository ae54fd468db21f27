//! Bearer-credential extraction from request headers.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::CookieJar;

const BEARER_PREFIX: &str = "bearer ";

/// Pulls a bearer credential out of the request headers.
///
/// A present, non-empty `Authorization` header always wins: when its value
/// carries the bearer scheme (case-insensitive), the remainder is the
/// credential; when it does not, extraction yields nothing and the cookie is
/// deliberately not consulted. The cookie fallback applies only when the
/// header is absent or empty and a cookie name is configured. A configured
/// cookie's value is returned even when empty; callers treat an empty
/// credential as absent.
#[must_use]
pub fn bearer_token(headers: &HeaderMap, cookie_name: Option<&str>) -> Option<String> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if auth.len() > BEARER_PREFIX.len()
        && auth[..BEARER_PREFIX.len()].eq_ignore_ascii_case(BEARER_PREFIX)
    {
        return Some(auth[BEARER_PREFIX.len()..].to_string());
    }

    if auth.is_empty() {
        if let Some(name) = cookie_name {
            let jar = CookieJar::from_headers(headers);
            if let Some(cookie) = jar.get(name) {
                return Some(cookie.value().to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn headers(auth: Option<&str>, cookie: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = auth {
            headers.insert(AUTHORIZATION, auth.parse().expect("header value"));
        }
        if let Some(cookie) = cookie {
            headers.insert(COOKIE, cookie.parse().expect("cookie value"));
        }
        headers
    }

    #[test]
    fn no_header_no_cookie_yields_nothing() {
        assert_eq!(bearer_token(&headers(None, None), None), None);
        assert_eq!(bearer_token(&headers(None, None), Some("sess")), None);
    }

    #[test]
    fn bearer_header_yields_token() {
        let headers = headers(Some("bearer ABC123"), None);
        assert_eq!(bearer_token(&headers, None), Some("ABC123".to_string()));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for value in ["Bearer ABC123", "BEARER ABC123", "bEaReR ABC123"] {
            let headers = headers(Some(value), None);
            assert_eq!(bearer_token(&headers, None), Some("ABC123".to_string()));
        }
    }

    #[test]
    fn bearer_scheme_without_token_yields_nothing() {
        let headers = headers(Some("bearer "), None);
        assert_eq!(bearer_token(&headers, None), None);
    }

    #[test]
    fn header_wins_over_cookie() {
        let headers = headers(Some("bearer ABC123"), Some("sess=XYZ"));
        assert_eq!(
            bearer_token(&headers, Some("sess")),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn cookie_fallback_when_header_absent() {
        let headers = headers(None, Some("sess=XYZ"));
        assert_eq!(bearer_token(&headers, Some("sess")), Some("XYZ".to_string()));
    }

    #[test]
    fn malformed_header_suppresses_cookie_fallback() {
        let headers = headers(Some("invalid"), Some("sess=XYZ"));
        assert_eq!(bearer_token(&headers, Some("sess")), None);
    }

    #[test]
    fn cookie_ignored_without_configured_name() {
        let headers = headers(None, Some("sess=XYZ"));
        assert_eq!(bearer_token(&headers, None), None);
    }

    #[test]
    fn other_cookies_do_not_match() {
        let headers = headers(None, Some("other=XYZ"));
        assert_eq!(bearer_token(&headers, Some("sess")), None);
    }

    #[test]
    fn empty_cookie_value_is_returned_verbatim() {
        let headers = headers(None, Some("sess="));
        assert_eq!(bearer_token(&headers, Some("sess")), Some(String::new()));
    }
}
