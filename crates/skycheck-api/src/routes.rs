//! Route table.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use skycheck_jobs::CheckInService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Build the `/api` router over a shared service.
pub fn create_router(service: Arc<CheckInService>) -> Router {
    let checkins = Router::new()
        .route(
            "/",
            get(handlers::list_checkins).post(handlers::create_checkin),
        )
        .route(
            "/{id}",
            get(handlers::get_checkin).delete(handlers::cancel_checkin),
        )
        .route("/{id}/logs", get(handlers::checkin_logs));

    let api = Router::new()
        .route("/status", get(handlers::status))
        .nest("/checkins", checkins);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
