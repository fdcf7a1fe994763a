//! HTTP API — axum router, middleware stack and endpoint handlers.
//!
//! Routes are nested under `/api/`; uploaded profile photos are served
//! under `/media/`. The router is composable — `api_router()` returns a
//! `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod types;

pub use router::api_router;
pub use types::ApiContext;
