//! agora-server: HTTP surface for agora
//!
//! Users, chat completion, file storage and WebSocket broadcast over axum.
//! Each request that touches the database runs one scoped unit of work.

pub mod http;
pub mod models;
pub mod state;

pub use http::{build_router, run_server, ApiError, ServerConfig, ServerError};
pub use state::AppState;
