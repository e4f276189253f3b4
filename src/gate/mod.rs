//! Session-aware request gate
//!
//! Runs before routing on every request. Paths under a public prefix pass
//! untouched. Anything else inside the protected matcher needs a session
//! token the [`TokenVerifier`] accepts; without one the request never
//! reaches the application and the client is redirected to the login page
//! with every session cookie cleared.
//!
//! The gate is total: verifier failures count as "no valid token" and no
//! error ever reaches the caller. It keeps no state between requests.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CACHE_CONTROL, LOCATION, SET_COOKIE};
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, error};

use crate::auth::{ClearCookie, SessionClaims, SessionSecret};
use crate::types::GateError;

/// Public prefixes the application ships with, in match order
pub const DEFAULT_PUBLIC_PREFIXES: &[&str] = &["/login", "/signup", "/api/auth", "/api/auth/callback"];

/// Areas the gate is mounted in front of
pub const DEFAULT_PROTECTED_PATHS: &[&str] = &["/dashboard", "/api"];

pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Capability that turns a request into verified session claims.
///
/// `Ok(None)` means no token was presented; `Err` covers tokens that are
/// present but unacceptable as well as any failure inside the verifier.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(
        &self,
        request: &Parts,
        secret: &SessionSecret,
    ) -> Result<Option<SessionClaims>, GateError>;
}

/// Whether a path needs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClassification {
    Public,
    Protected,
}

/// Static gate configuration, built once at start-up
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Ordered public prefixes; plain case-sensitive `starts_with`, first match wins
    pub public_prefixes: Vec<String>,
    /// Matcher set the gate applies to. Empty means every path.
    pub protected_paths: Vec<String>,
    /// Redirect target for rejected requests
    pub login_path: String,
    /// Base session cookie name; the `__Secure-` variant is derived from it
    pub session_cookie: String,
    pub secret: SessionSecret,
}

impl GateConfig {
    /// Configuration with the application's default paths and cookie name
    pub fn with_defaults(secret: SessionSecret) -> Self {
        Self {
            public_prefixes: DEFAULT_PUBLIC_PREFIXES.iter().map(|s| s.to_string()).collect(),
            protected_paths: DEFAULT_PROTECTED_PATHS.iter().map(|s| s.to_string()).collect(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            session_cookie: crate::auth::cookies::DEFAULT_SESSION_COOKIE.to_string(),
            secret,
        }
    }

    /// Classify a request path. Recomputed per request, never stored.
    pub fn classify(&self, path: &str) -> PathClassification {
        if self
            .public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return PathClassification::Public;
        }

        if self.protected_paths.is_empty()
            || self
                .protected_paths
                .iter()
                .any(|area| matches_area(path, area))
        {
            PathClassification::Protected
        } else {
            PathClassification::Public
        }
    }
}

/// `/dashboard` matches `/dashboard` and `/dashboard/...` but not `/dashboards`
fn matches_area(path: &str, area: &str) -> bool {
    match path.strip_prefix(area) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || area.ends_with('/'),
        None => false,
    }
}

/// Outcome of evaluating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin {
        location: String,
        clear_cookies: Vec<ClearCookie>,
    },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Cookie clears to attach to the response (always empty for `Allow`)
    pub fn clear_cookies(&self) -> &[ClearCookie] {
        match self {
            Decision::Allow => &[],
            Decision::RedirectToLogin { clear_cookies, .. } => clear_cookies.as_slice(),
        }
    }
}

/// What the server does next: hand the untouched request on, or answer now
#[derive(Debug)]
pub enum GateOutcome<B> {
    Allow(Request<B>),
    Redirect(Response<Full<Bytes>>),
}

/// Pre-routing gate enforcing "valid session or redirect to login"
#[derive(Clone)]
pub struct RequestGate {
    config: Arc<GateConfig>,
    verifier: Arc<dyn TokenVerifier>,
}

impl RequestGate {
    pub fn new(config: &GateConfig, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            config: Arc::new(config.clone()),
            verifier,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Clear instructions for every known session cookie name
    pub fn session_cookie_clears(&self) -> Vec<ClearCookie> {
        ClearCookie::for_session(&self.config.session_cookie)
    }

    /// Decide on a request without consuming it
    pub async fn decide(&self, request: &Parts) -> Decision {
        let path = request.uri.path();

        if self.config.classify(path) == PathClassification::Public {
            debug!(path, "gate: public path");
            return Decision::Allow;
        }

        let session = match self.verifier.verify(request, &self.config.secret).await {
            Ok(session) => session,
            Err(e) => {
                debug!(path, error = %e, "gate: token verification failed");
                None
            }
        };

        match session {
            Some(claims) => {
                debug!(path, user = %claims.sub, "gate: session accepted");
                Decision::Allow
            }
            None => {
                debug!(path, login = %self.config.login_path, "gate: redirecting to login");
                Decision::RedirectToLogin {
                    location: self.config.login_path.clone(),
                    clear_cookies: self.session_cookie_clears(),
                }
            }
        }
    }

    /// Evaluate a request, passing it through unmodified or producing the redirect
    pub async fn evaluate<B>(&self, request: Request<B>) -> GateOutcome<B> {
        let (parts, body) = request.into_parts();

        match self.decide(&parts).await {
            Decision::Allow => GateOutcome::Allow(Request::from_parts(parts, body)),
            Decision::RedirectToLogin {
                location,
                clear_cookies,
            } => GateOutcome::Redirect(redirect_response(&location, &clear_cookies)),
        }
    }
}

/// `307` to `location` carrying one `Set-Cookie` per clear instruction
pub fn redirect_response(location: &str, clear_cookies: &[ClearCookie]) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;

    let headers = response.headers_mut();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(LOCATION, value);
        }
        Err(_) => error!(location, "gate: login path is not a valid Location header"),
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    append_clear_cookies(headers, clear_cookies);

    response
}

/// Append `Set-Cookie` clears to an outgoing header map
pub fn append_clear_cookies(headers: &mut hyper::HeaderMap, clear_cookies: &[ClearCookie]) {
    for clear in clear_cookies {
        if let Ok(value) = HeaderValue::from_str(&clear.header_value()) {
            headers.append(SET_COOKIE, value);
        }
    }
}
