//! HTTP surface: router, shared state and handlers.

pub mod api;
pub mod state;

pub use api::{app_api_loop, create_router};
pub use state::AppState;
