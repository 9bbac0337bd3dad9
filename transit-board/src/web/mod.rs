//! Web layer for the arrival board service.
//!
//! Provides JSON endpoints for station lookup and arrival boards.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
