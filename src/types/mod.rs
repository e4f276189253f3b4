//! Shared types for watson-gate

pub mod error;

pub use error::{GateError, Result};
