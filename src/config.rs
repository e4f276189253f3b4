//! Configuration for watson-gate
//!
//! CLI arguments and environment variable handling using clap. Everything the
//! gate needs (secret included) is resolved here once at start-up and handed
//! over as a [`GateConfig`]; nothing reads the environment per request.

use clap::Parser;
use hyper::header::HeaderValue;
use std::net::SocketAddr;

use crate::auth::cookies::DEFAULT_SESSION_COOKIE;
use crate::auth::SessionSecret;
use crate::gate::GateConfig;
use crate::types::GateError;

/// Longest session lifetime accepted (ten years)
pub const MAX_SESSION_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Watson legal assistant back end with a session-aware request gate
#[derive(Parser, Debug, Clone)]
#[command(name = "watson-gate")]
#[command(about = "Session-aware request gate and auth back end for the Watson legal assistant")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// HMAC secret for session tokens (required outside dev mode, >= 32 chars)
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Enable development mode (built-in insecure session secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Session lifetime in seconds
    #[arg(long, env = "SESSION_TTL_SECONDS", default_value = "2592000")]
    pub session_ttl_seconds: u64,

    /// Base name of the session cookie; `__Secure-` variant is derived
    #[arg(long, env = "SESSION_COOKIE", default_value = DEFAULT_SESSION_COOKIE)]
    pub session_cookie: String,

    /// Issue session cookies under the `__Secure-` name with the Secure attribute
    #[arg(long, env = "SECURE_COOKIES", default_value = "false")]
    pub secure_cookies: bool,

    /// Where rejected requests are redirected
    #[arg(long, env = "LOGIN_PATH", default_value = "/login")]
    pub login_path: String,

    /// Where the client goes after a successful login
    #[arg(long, env = "AFTER_LOGIN_PATH", default_value = "/dashboard")]
    pub after_login_path: String,

    /// Ordered, comma-separated public path prefixes
    #[arg(
        long,
        env = "PUBLIC_PATHS",
        value_delimiter = ',',
        default_values = ["/login", "/signup", "/api/auth", "/api/auth/callback"]
    )]
    pub public_paths: Vec<String>,

    /// Comma-separated areas the gate protects
    #[arg(
        long,
        env = "PROTECTED_PATHS",
        value_delimiter = ',',
        default_values = ["/dashboard", "/api"]
    )]
    pub protected_paths: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Effective session secret (built-in value in dev mode when unset)
    pub fn session_secret(&self) -> Result<SessionSecret, GateError> {
        match (&self.session_secret, self.dev_mode) {
            (Some(secret), _) => SessionSecret::new(secret.clone()),
            (None, true) => Ok(SessionSecret::dev()),
            (None, false) => Err(GateError::Config(
                "SESSION_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Build the gate configuration from the parsed arguments
    pub fn gate_config(&self) -> Result<GateConfig, GateError> {
        if HeaderValue::from_str(&self.login_path).is_err() {
            return Err(GateError::Config(format!(
                "LOGIN_PATH {} cannot be sent as a Location header",
                self.login_path
            )));
        }

        Ok(GateConfig {
            public_prefixes: clean_list(&self.public_paths),
            protected_paths: clean_list(&self.protected_paths),
            login_path: self.login_path.clone(),
            session_cookie: self.session_cookie.clone(),
            secret: self.session_secret()?,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.session_secret().map_err(|e| e.to_string())?;

        if !self.login_path.starts_with('/') {
            return Err("LOGIN_PATH must start with '/'".to_string());
        }
        if HeaderValue::from_str(&self.login_path).is_err() {
            return Err(format!(
                "LOGIN_PATH {} is not a valid Location header value (visible ASCII only)",
                self.login_path
            ));
        }

        let public = clean_list(&self.public_paths);
        if public.is_empty() {
            return Err("PUBLIC_PATHS must name at least one prefix".to_string());
        }
        if !public.iter().any(|p| self.login_path.starts_with(p.as_str())) {
            return Err(format!(
                "LOGIN_PATH {} is not covered by PUBLIC_PATHS (redirect would loop)",
                self.login_path
            ));
        }

        if self.session_cookie.is_empty()
            || self
                .session_cookie
                .contains(|c: char| c == ';' || c == '=' || c == ',' || c.is_whitespace())
        {
            return Err("SESSION_COOKIE is not a valid cookie name".to_string());
        }

        if self.session_ttl_seconds == 0 {
            return Err("SESSION_TTL_SECONDS must be greater than zero".to_string());
        }
        if self.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(format!(
                "SESSION_TTL_SECONDS must be at most {}",
                MAX_SESSION_TTL_SECONDS
            ));
        }

        Ok(())
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
