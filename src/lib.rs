//! watson-gate - back end for the Watson legal assistant
//!
//! Serves the account, session and chat endpoints of the web application
//! behind a session-aware request gate.
//!
//! ## Components
//!
//! - **Gate**: pre-routing check that lets public paths through, requires a
//!   valid session everywhere else, and redirects to login with the session
//!   cookies cleared when there is none
//! - **Auth**: JWT session tokens, session cookies, Argon2 password hashing
//! - **Users**: account registration storage
//! - **Routes**: register/login/signout/session, chat, page shells, probes

pub mod auth;
pub mod config;
pub mod gate;
pub mod routes;
pub mod server;
pub mod types;
pub mod users;

pub use config::Args;
pub use gate::{Decision, GateConfig, GateOutcome, PathClassification, RequestGate, TokenVerifier};
pub use server::{run, AppState};
pub use types::{GateError, Result};
