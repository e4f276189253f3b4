//! Page shells
//!
//! The front end renders these; the back end only reports which page was
//! requested so the client router can take over.

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{json_response, BoxBody};

#[derive(Debug, Serialize)]
pub struct PageShell<'a> {
    pub page: &'a str,
    pub path: &'a str,
}

/// Map a GET path to a page name, `None` for anything that is not a page
pub fn page_for(path: &str) -> Option<&'static str> {
    match path {
        "/" => Some("home"),
        "/login" => Some("login"),
        "/signup" => Some("signup"),
        p if p == "/dashboard" || p.starts_with("/dashboard/") => Some("dashboard"),
        _ => None,
    }
}

pub fn page_response(page: &str, path: &str) -> Response<BoxBody> {
    json_response(StatusCode::OK, &PageShell { page, path })
}
