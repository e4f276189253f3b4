//! JWT session tokens
//!
//! Session tokens are HS256 JWTs signed with the process-wide session
//! secret. They travel in the session cookie (or, for API clients, an
//! `Authorization: Bearer` header).
//!
//! Security notes:
//! - Expiry is enforced with zero leeway
//! - The secret must be at least 32 characters outside dev mode

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hyper::header::AUTHORIZATION;
use hyper::http::request::Parts;
use hyper::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::cookies::{get_cookie, session_cookie_names};
use crate::gate::TokenVerifier;
use crate::types::GateError;

const MIN_SECRET_LEN: usize = 32;

/// Shared HMAC secret for signing and verifying session tokens
#[derive(Clone)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Wrap a secret, rejecting empty or short values
    pub fn new(secret: impl Into<String>) -> Result<Self, GateError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(GateError::Config(
                "SESSION_SECRET is required in production mode".into(),
            ));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(GateError::Config(format!(
                "SESSION_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        Ok(Self(secret))
    }

    /// Secret for dev mode only
    pub fn dev() -> Self {
        Self("dev-mode-session-secret-not-for-production".into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(**redacted**)")
    }
}

/// Payload stored in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Who a new session is for
#[derive(Debug, Clone)]
pub struct SessionInput {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
}

impl SessionClaims {
    /// Claims valid from `issued_at` for `ttl_seconds`.
    ///
    /// Fails when the expiry does not fit an `i64` Unix timestamp.
    pub fn new(input: SessionInput, issued_at: u64, ttl_seconds: u64) -> Result<Self, GateError> {
        let exp = issued_at
            .checked_add(ttl_seconds)
            .filter(|exp| i64::try_from(*exp).is_ok())
            .ok_or_else(|| {
                GateError::Config(format!("Session lifetime of {}s overflows expiry", ttl_seconds))
            })?;

        Ok(Self {
            sub: input.user_id,
            email: input.email,
            name: input.name,
            iat: issued_at,
            exp,
        })
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> Result<u64, GateError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| GateError::Auth(format!("System time error: {}", e)))
}

/// Sign claims into a compact JWT
pub fn encode_claims(secret: &SessionSecret, claims: &SessionClaims) -> Result<String, GateError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| GateError::Auth(format!("Failed to generate token: {}", e)))
}

/// Issue a session token valid for `ttl_seconds` from now
pub fn issue_session_token(
    secret: &SessionSecret,
    input: SessionInput,
    ttl_seconds: u64,
) -> Result<String, GateError> {
    let claims = SessionClaims::new(input, unix_now()?, ttl_seconds)?;
    encode_claims(secret, &claims)
}

/// Verify signature and expiry, returning the decoded claims
pub fn decode_session_token(secret: &SessionSecret, token: &str) -> Result<SessionClaims, GateError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

/// Verifies session JWTs carried in the session cookie or bearer header
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    cookie_names: [String; 2],
}

impl JwtVerifier {
    pub fn new(cookie_base: &str) -> Self {
        Self {
            cookie_names: session_cookie_names(cookie_base),
        }
    }

    /// Locate the raw token: secure cookie, plain cookie, then bearer header
    pub fn find_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        self.cookie_names
            .iter()
            .find_map(|name| get_cookie(headers, name))
            .or_else(|| {
                extract_token_from_header(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
            })
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(
        &self,
        request: &Parts,
        secret: &SessionSecret,
    ) -> Result<Option<SessionClaims>, GateError> {
        match self.find_token(&request.headers) {
            Some(token) => decode_session_token(secret, token).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    fn test_secret() -> SessionSecret {
        SessionSecret::new("test-secret-that-is-at-least-32-characters-long").unwrap()
    }

    fn input() -> SessionInput {
        SessionInput {
            user_id: "user-123".into(),
            email: "counsel@example.com".into(),
            name: Some("Ada Counsel".into()),
        }
    }

    fn parts_with(header: &str, value: &str) -> Parts {
        Request::builder()
            .uri("/dashboard")
            .header(header, value)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_issue_and_decode() {
        let secret = test_secret();
        let token = issue_session_token(&secret, input(), 3600).unwrap();
        let claims = decode_session_token(&secret, &token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "counsel@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = test_secret();
        let now = unix_now().unwrap();
        let claims = SessionClaims::new(input(), now - 7200, 3600).unwrap();
        let token = encode_claims(&secret, &claims).unwrap();

        let err = decode_session_token(&secret, &token).unwrap_err();
        assert!(matches!(err, GateError::TokenVerification(ref m) if m == "Token expired"));
    }

    #[test]
    fn test_expiry_overflow_is_error() {
        let now = unix_now().unwrap();
        assert!(SessionClaims::new(input(), now, u64::MAX).is_err());
        assert!(SessionClaims::new(input(), now, i64::MAX as u64).is_err());
        assert!(issue_session_token(&test_secret(), input(), u64::MAX).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_session_token(&test_secret(), input(), 3600).unwrap();
        let other = SessionSecret::new("different-secret-that-is-at-least-32-characters").unwrap();
        assert!(decode_session_token(&other, &token).is_err());
    }

    #[test]
    fn test_garbage_token() {
        assert!(decode_session_token(&test_secret(), "not-a-jwt").is_err());
    }

    #[test]
    fn test_secret_validation() {
        assert!(SessionSecret::new("short").is_err());
        assert!(SessionSecret::new("").is_err());
        assert!(SessionSecret::new("this-secret-is-at-least-32-chars-long").is_ok());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let rendered = format!("{:?}", test_secret());
        assert!(!rendered.contains("test-secret"));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_find_token_prefers_secure_cookie() {
        let verifier = JwtVerifier::new("sid");
        let parts = parts_with("cookie", "sid=plain; __Secure-sid=secure");
        assert_eq!(verifier.find_token(&parts.headers), Some("secure"));
    }

    #[test]
    fn test_find_token_falls_back_to_bearer() {
        let verifier = JwtVerifier::new("sid");
        let parts = parts_with("authorization", "Bearer from-header");
        assert_eq!(verifier.find_token(&parts.headers), Some("from-header"));
    }

    #[tokio::test]
    async fn test_verify_without_token_is_none() {
        let verifier = JwtVerifier::new("sid");
        let parts = parts_with("accept", "text/html");
        let result = verifier.verify(&parts, &test_secret()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_verify_valid_cookie() {
        let secret = test_secret();
        let token = issue_session_token(&secret, input(), 3600).unwrap();
        let verifier = JwtVerifier::new("sid");
        let parts = parts_with("cookie", &format!("sid={token}"));

        let claims = verifier.verify(&parts, &secret).await.unwrap().unwrap();
        assert_eq!(claims.email, "counsel@example.com");
    }

    #[tokio::test]
    async fn test_verify_invalid_cookie_is_error() {
        let verifier = JwtVerifier::new("sid");
        let parts = parts_with("cookie", "sid=forged.token.value");
        assert!(verifier.verify(&parts, &test_secret()).await.is_err());
    }
}
