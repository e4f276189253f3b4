//! Authentication primitives
//!
//! Provides:
//! - Session cookie lookup and `Set-Cookie` rendering
//! - JWT session token issuance and the JWT-backed [`TokenVerifier`](crate::gate::TokenVerifier)
//! - Password hashing with Argon2

pub mod cookies;
pub mod jwt;
pub mod password;

pub use cookies::{get_cookie, session_cookie, session_cookie_names, ClearCookie, SECURE_PREFIX};
pub use jwt::{
    decode_session_token, extract_token_from_header, issue_session_token, JwtVerifier,
    SessionClaims, SessionInput, SessionSecret,
};
pub use password::{hash_password, verify_password};
