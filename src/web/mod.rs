//! Presentation layer: the HTTP API and the embedded chat page.

pub mod dto;
pub mod page;
pub mod routes;
pub mod server;

pub use routes::ApiError;
pub use server::{router, run, serve_with_listener, AppState};
