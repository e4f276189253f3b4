//! Health and version endpoints
//!
//! - /health, /healthz - Liveness probe
//! - /version          - Build info for deployment verification
//!
//! Both sit outside the protected matcher so probes never need a session.

use std::sync::Arc;

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    /// Operating mode
    pub mode: &'static str,
    #[serde(rename = "registeredUsers")]
    pub registered_users: usize,
    pub timestamp: String,
}

/// Handle liveness probe
///
/// Always 200 while the process is serving.
pub async fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    let registered_users = state.users.count().await.unwrap_or(0);

    let response = HealthResponse {
        status: "healthy",
        service: "watson-gate",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        registered_users,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    json_response(StatusCode::OK, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<BoxBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "watson-gate",
    };

    json_response(StatusCode::OK, &response)
}
