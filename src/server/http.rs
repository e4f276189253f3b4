//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every request goes
//! through the [`RequestGate`] before routing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtVerifier;
use crate::config::Args;
use crate::gate::{GateOutcome, RequestGate};
use crate::routes::{
    self, handle_auth_request, handle_chat, handle_upload, method_not_allowed, not_found_response, page_for,
    page_response, preflight_response, to_boxed, BoxBody, ChatResponder, PlaceholderResponder,
};
use crate::types::GateError;
use crate::users::{MemoryUserStore, UserStore};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Pre-routing session gate
    pub gate: RequestGate,
    /// Registered accounts
    pub users: Arc<dyn UserStore>,
    /// Answers for /api/chat
    pub chat: Arc<dyn ChatResponder>,
    pub started_at: Instant,
}

impl AppState {
    /// Default wiring: JWT verifier, in-memory users, placeholder chat
    pub fn new(args: Args) -> Result<Self, GateError> {
        let config = args.gate_config()?;
        let verifier = Arc::new(JwtVerifier::new(&config.session_cookie));
        let gate = RequestGate::new(&config, verifier);

        Ok(Self::with_components(
            args,
            gate,
            Arc::new(MemoryUserStore::new()),
            Arc::new(PlaceholderResponder),
        ))
    }

    pub fn with_components(
        args: Args,
        gate: RequestGate,
        users: Arc<dyn UserStore>,
        chat: Arc<dyn ChatResponder>,
    ) -> Self {
        Self {
            args,
            gate,
            users,
            chat,
            started_at: Instant::now(),
        }
    }

    /// Dev-mode state with default paths
    #[cfg(test)]
    pub fn for_tests() -> Self {
        use clap::Parser;
        let args = Args::try_parse_from(["watson-gate", "--dev-mode"])
            .expect("dev-mode args parse");
        Self::new(args).expect("dev-mode state builds")
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GateError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("watson-gate listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - using built-in session secret");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Entry point for each hyper request
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = route_request(state, req).await;
    debug!("[{}] {} {} -> {}", addr, method, path, response.status());

    Ok(response)
}

/// Gate the request, then dispatch it
pub async fn route_request<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let req = match state.gate.evaluate(req).await {
        GateOutcome::Allow(req) => req,
        GateOutcome::Redirect(redirect) => return to_boxed(redirect),
    };

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state)).await
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight; only reached on paths the gate let through
        (Method::OPTIONS, _) => preflight_response(),

        // Account and session management (public prefix)
        (_, p) if p.starts_with("/api/auth") => handle_auth_request(req, state).await,

        (Method::POST, "/api/chat") => handle_chat(req, state).await,
        (_, "/api/chat") => method_not_allowed(),

        (Method::POST, "/api/upload") => handle_upload(req).await,
        (_, "/api/upload") => method_not_allowed(),

        (Method::GET, p) => match page_for(p) {
            Some(page) => page_response(page, p),
            None => not_found_response(p),
        },

        (_, p) => not_found_response(p),
    }
}
