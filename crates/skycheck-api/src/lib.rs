//! # skycheck API
//!
//! Thin axum surface over [`CheckInService`](skycheck_jobs::CheckInService).
//!
//! ```text
//! GET    /api/status              - heartbeat and queue depth
//! GET    /api/checkins            - every check-in, newest first
//! POST   /api/checkins            - schedule a check-in
//! GET    /api/checkins/{id}       - one check-in
//! DELETE /api/checkins/{id}       - cancel a scheduled check-in
//! GET    /api/checkins/{id}/logs  - output and timing
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{ApiConfig, ApiServer};
