//! HTTP routes for watson-gate

pub mod auth_routes;
pub mod chat;
pub mod documents;
pub mod health;
pub mod pages;
pub mod response;

pub use auth_routes::handle_auth_request;
pub use chat::{handle_chat, ChatRequest, ChatResponder, ChatResponse, PlaceholderResponder};
pub use documents::handle_upload;
pub use health::{health_check, version_info};
pub use pages::{page_for, page_response};
pub use response::{
    error_response, json_response, method_not_allowed, not_found_response, preflight_response,
    to_boxed, BoxBody,
};
