//! swapquote API
//!
//! Axum router exposing one-shot route quotes and refreshing watches over the engine.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::{create_router, create_router_with_limit, DEFAULT_BODY_LIMIT_BYTES};
pub use state::AppState;
