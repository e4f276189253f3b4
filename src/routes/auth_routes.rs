//! HTTP routes for account and session management
//!
//! All of these live under the public `/api/auth` prefix:
//! - POST /api/auth/register - Create an account
//! - POST /api/auth/login    - Check credentials and set the session cookie
//! - POST /api/auth/signout  - Clear the session cookies
//! - GET  /api/auth/session  - Describe the current session, `{}` if none

use std::sync::Arc;

use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{
    decode_session_token, hash_password, issue_session_token, session_cookie, verify_password,
    JwtVerifier, SessionInput,
};
use crate::gate::append_clear_cookies;
use crate::routes::response::{
    error_response, json_response, method_not_allowed, not_found_response, parse_json_body,
    read_body, BoxBody,
};
use crate::server::AppState;
use crate::types::GateError;
use crate::users::NewUser;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: SessionUser,
    /// RFC 3339 expiry
    pub expires: String,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Route a request under `/api/auth`
pub async fn handle_auth_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let subpath = path.trim_start_matches("/api/auth").trim_end_matches('/');

    let result = match (req.method().clone(), subpath) {
        (Method::POST, "/register") => handle_register(req, &state).await,
        (Method::POST, "/login") | (Method::POST, "/callback/credentials") => {
            handle_login(req, &state).await
        }
        (Method::POST, "/signout") | (Method::POST, "/logout") => Ok(handle_signout(&state)),
        (Method::GET, "/session") => Ok(handle_session(&req, &state)),
        (_, "/register" | "/login" | "/signout" | "/logout" | "/session") => {
            Ok(method_not_allowed())
        }
        _ => Ok(not_found_response(&path)),
    };

    result.unwrap_or_else(|e| e.into())
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /api/auth/register
///
/// Existence check and insert happen atomically inside the user store.
async fn handle_register<B>(req: Request<B>, state: &AppState) -> Result<Response<BoxBody>, GateError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body: RegisterRequest = parse_json_body(req).await?;

    if body.email.is_empty() || body.password.is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing fields"));
    }

    if state.users.find_by_email(&body.email).await?.is_some() {
        return Ok(error_response(StatusCode::CONFLICT, "User already exists"));
    }

    let password_hash = hash_password(&body.password)?;
    let record = state
        .users
        .insert(NewUser {
            name: body.name.filter(|n| !n.trim().is_empty()),
            email: body.email,
            password_hash,
        })
        .await?;

    info!(user_id = %record.id, "Registered new user");
    Ok(json_response(StatusCode::OK, &SuccessResponse { success: true }))
}

/// POST /api/auth/login
///
/// Accepts JSON or a url-encoded form.
async fn handle_login<B>(req: Request<B>, state: &AppState) -> Result<Response<BoxBody>, GateError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let body: LoginRequest = if is_form {
        let bytes = read_body(req).await?;
        serde_urlencoded::from_bytes(&bytes)
            .map_err(|e| GateError::BadRequest(format!("Invalid form: {}", e)))?
    } else {
        parse_json_body(req).await?
    };

    if body.email.is_empty() || body.password.is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "Missing credentials"));
    }

    let user = match state.users.find_by_email(&body.email).await? {
        Some(user) if verify_password(&body.password, &user.password_hash)? => user,
        _ => {
            warn!("Failed login attempt");
            return Err(GateError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }
    };

    let ttl = state.args.session_ttl_seconds;
    let token = issue_session_token(
        &state.gate.config().secret,
        SessionInput {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
        },
        ttl,
    )?;

    let cookie = session_cookie(
        &state.args.session_cookie,
        &token,
        ttl,
        state.args.secure_cookies,
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| GateError::Internal(format!("Invalid session cookie: {}", e)))?;

    info!(user_id = %user.id, "User logged in");

    let mut response = json_response(
        StatusCode::OK,
        &LoginResponse {
            ok: true,
            url: state.args.after_login_path.clone(),
        },
    );
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

/// POST /api/auth/signout
fn handle_signout(state: &AppState) -> Response<BoxBody> {
    let mut response = json_response(StatusCode::OK, &serde_json::json!({ "ok": true }));
    append_clear_cookies(response.headers_mut(), &state.gate.session_cookie_clears());
    response
}

/// GET /api/auth/session
fn handle_session<B>(req: &Request<B>, state: &AppState) -> Response<BoxBody> {
    let verifier = JwtVerifier::new(&state.args.session_cookie);
    let claims = verifier
        .find_token(req.headers())
        .and_then(|token| decode_session_token(&state.gate.config().secret, token).ok());

    match claims {
        Some(claims) => {
            let expires = i64::try_from(claims.exp)
                .ok()
                .and_then(|exp| chrono::DateTime::<chrono::Utc>::from_timestamp(exp, 0))
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            json_response(
                StatusCode::OK,
                &SessionResponse {
                    user: SessionUser {
                        id: claims.sub,
                        email: claims.email,
                        name: claims.name,
                    },
                    expires,
                },
            )
        }
        None => json_response(StatusCode::OK, &serde_json::json!({})),
    }
}
