//! Shared types and advisors for the Agricultural Advisory Platform
//!
//! This crate holds the domain models and the pure decision logic
//! (irrigation, fertilizer, disease lookup) shared between the backend
//! and the browser client (via WASM).

pub mod fallback;
pub mod models;
pub mod types;
pub mod validation;

pub use fallback::*;
pub use models::*;
pub use types::*;
pub use validation::*;
