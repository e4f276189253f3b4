//! watson-gate - session-gated back end for the Watson legal assistant

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use watson_gate::{config::Args, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("watson_gate={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  watson-gate");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Login path: {}", args.login_path);
    info!("Public prefixes: {}", args.public_paths.join(", "));
    if args.protected_paths.is_empty() {
        info!("Protected paths: (all non-public)");
    } else {
        info!("Protected paths: {}", args.protected_paths.join(", "));
    }
    info!("Session cookie: {}", args.session_cookie);
    info!("======================================");

    if !args.secure_cookies {
        warn!("Session cookies issued without the Secure attribute");
    }

    let state = Arc::new(AppState::new(args)?);
    server::run(state).await?;

    Ok(())
}
