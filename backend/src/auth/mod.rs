//! Session credential verification.
//!
//! The admin console stores a signed JWT in the `token` cookie. Verification
//! is stateless: it depends only on the cookie header, the shared secret and
//! the current time. Every failure collapses to `false`.

use std::fmt;

use cookie::Cookie;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Settings for JWT verification.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Shared HMAC secret
    pub secret: String,
    /// Expected `iss` claim, if any
    pub issuer: Option<String>,
    /// Reject tokens that carry no `exp` claim
    pub require_exp: bool,
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("require_exp", &self.require_exp)
            .finish()
    }
}

/// Gate run before any data access.
pub trait CredentialVerifier: Send + Sync {
    /// Return whether the request carrying `cookie_header` is authenticated.
    fn verify(&self, cookie_header: Option<&str>) -> bool;
}

/// Registered claims the verifier relies on.
///
/// Each may be absent, but when present it must have the registered type.
/// A string, fractional, negative or null `exp` fails decoding instead of
/// being skipped by time validation.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct SessionClaims {
    #[serde(default, deserialize_with = "present")]
    exp: Option<u64>,
    #[serde(default, deserialize_with = "present")]
    nbf: Option<u64>,
    #[serde(default, deserialize_with = "present")]
    iss: Option<String>,
}

/// A claim that is present must not be null.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Verifies the HMAC-signed JWT found in the `token` cookie.
#[derive(Clone)]
pub struct JwtCookieVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtCookieVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        if config.require_exp {
            validation.required_spec_claims.insert("exp".to_string());
        }
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Check a bare token.
    pub fn verify_token(&self, token: &str) -> bool {
        match decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(_) => true,
            Err(e) => {
                debug!(reason = ?e.kind(), "Rejected session token");
                false
            }
        }
    }
}

impl fmt::Debug for JwtCookieVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCookieVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier for JwtCookieVerifier {
    fn verify(&self, cookie_header: Option<&str>) -> bool {
        match cookie_header.and_then(extract_token) {
            Some(token) => self.verify_token(&token),
            None => {
                debug!("No session token cookie on request");
                false
            }
        }
    }
}

/// Find the session token in a `Cookie` header.
///
/// Malformed pairs are skipped; the first `token` cookie wins. An empty
/// value counts as absent.
pub fn extract_token(cookie_header: &str) -> Option<String> {
    Cookie::split_parse(cookie_header)
        .filter_map(Result::ok)
        .find(|c| c.name() == TOKEN_COOKIE)
        .map(|c| c.value_trimmed().to_string())
        .filter(|v| !v.is_empty())
}

/// One-shot verification of a cookie header against `secret`.
pub fn verify(cookie_header: Option<&str>, secret: &str) -> bool {
    JwtCookieVerifier::new(&AuthConfig::with_secret(secret)).verify(cookie_header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn cookie(token: &str) -> String {
        format!("theme=dark; {}={}; lang=fr", TOKEN_COOKIE, token)
    }

    #[test]
    fn test_valid_token_is_accepted() {
        let token = sign(json!({"sub": "admin", "exp": now() + 3600}), SECRET);
        assert!(verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        assert!(!verify(None, SECRET));
        assert!(!verify(Some(""), SECRET));
    }

    #[test]
    fn test_missing_cookie_is_rejected() {
        assert!(!verify(Some("theme=dark; lang=fr"), SECRET));
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(!verify(Some("token="), SECRET));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert!(!verify(Some("token=not.a.jwt"), SECRET));
        assert!(!verify(Some("token=garbage"), SECRET));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = sign(json!({"exp": now() + 3600}), "other-secret");
        assert!(!verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = sign(json!({"exp": now() - 3600}), SECRET);
        assert!(!verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_malformed_exp_is_rejected() {
        for exp in [json!("1000"), json!(1000.5), json!(-1), json!(null), json!({"at": 1})] {
            let token = sign(json!({"sub": "admin", "exp": exp}), SECRET);
            assert!(!verify(Some(&cookie(&token)), SECRET), "exp = {}", exp);
        }
    }

    #[test]
    fn test_far_future_string_exp_is_rejected() {
        let far = (now() + 3600).to_string();
        let token = sign(json!({"sub": "admin", "exp": far}), SECRET);
        assert!(!verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_malformed_nbf_is_rejected() {
        let token = sign(json!({"nbf": "0", "exp": now() + 3600}), SECRET);
        assert!(!verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_not_yet_valid_token_is_rejected() {
        let token = sign(json!({"nbf": now() + 3600, "exp": now() + 7200}), SECRET);
        assert!(!verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_token_without_exp_is_accepted_by_default() {
        let token = sign(json!({"sub": "admin"}), SECRET);
        assert!(verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_require_exp() {
        let verifier = JwtCookieVerifier::new(&AuthConfig {
            secret: SECRET.to_string(),
            require_exp: true,
            ..Default::default()
        });
        let token = sign(json!({"sub": "admin"}), SECRET);
        assert!(!verifier.verify(Some(&cookie(&token))));
    }

    #[test]
    fn test_issuer_must_match_when_configured() {
        let verifier = JwtCookieVerifier::new(&AuthConfig {
            secret: SECRET.to_string(),
            issuer: Some("survey-admin".to_string()),
            require_exp: false,
        });

        let good = sign(json!({"iss": "survey-admin", "exp": now() + 60}), SECRET);
        let bad = sign(json!({"iss": "someone-else", "exp": now() + 60}), SECRET);
        let missing = sign(json!({"exp": now() + 60}), SECRET);

        assert!(verifier.verify(Some(&cookie(&good))));
        assert!(!verifier.verify(Some(&cookie(&bad))));
        assert!(!verifier.verify(Some(&cookie(&missing))));
    }

    #[test]
    fn test_hs512_token_is_accepted() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &json!({"exp": now() + 60}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify(Some(&cookie(&token)), SECRET));
    }

    #[test]
    fn test_extract_token_first_wins() {
        assert_eq!(
            extract_token("token=first; token=second").as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_extract_token_skips_malformed_pairs() {
        assert_eq!(extract_token("garbage; token=abc").as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_strips_quotes() {
        assert_eq!(extract_token("token=\"abc\"").as_deref(), Some("abc"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = AuthConfig::with_secret("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
