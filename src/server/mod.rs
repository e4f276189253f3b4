//! HTTP server for watson-gate

pub mod http;

pub use http::{route_request, run, AppState};
