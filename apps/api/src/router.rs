use std::sync::Arc;

use axum::{routing::get, Router};

use scheduling_cell::{scheduling_routes, SchedulingState};

pub fn create_router(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Salon API is running!" }))
        .nest("/scheduling", scheduling_routes(state))
}
