//! Response and body helpers shared by route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::types::GateError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest request body any route accepts
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

/// Convert a Full<Bytes> response to BoxBody
pub fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        hyper::header::CACHE_CONTROL,
        hyper::header::HeaderValue::from_static("no-store"),
    );
    response
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: message.into(),
        },
    )
}

impl From<GateError> for Response<BoxBody> {
    fn from(err: GateError) -> Self {
        let status = err.status_code();
        let message = match err {
            GateError::BadRequest(m)
            | GateError::Unauthorized(m)
            | GateError::Conflict(m)
            | GateError::Http(m)
            | GateError::Auth(m) => m,
            // internal detail stays in the logs
            other => {
                tracing::error!("Request failed: {}", other);
                "Internal server error".to_string()
            }
        };
        error_response(status, message)
    }
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found", "path": path }),
    )
}

pub fn method_not_allowed() -> Response<BoxBody> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// CORS preflight response
pub fn preflight_response() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        "access-control-allow-methods",
        hyper::header::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        hyper::header::HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        "access-control-max-age",
        hyper::header::HeaderValue::from_static("86400"),
    );
    response
}

/// Read a bounded request body into memory
pub async fn read_body<B>(req: Request<B>) -> Result<Bytes, GateError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| GateError::Http(format!("Failed to read body: {}", e)))
}

pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, GateError>
where
    T: for<'de> Deserialize<'de>,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = read_body(req).await?;
    serde_json::from_slice(&bytes).map_err(|e| GateError::BadRequest(format!("Invalid JSON: {}", e)))
}
