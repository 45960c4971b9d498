// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;
use crate::store::SchedulingStore;

/// Shared cell state. Built once at startup: the booking service owns the
/// per-professional lock map, which must outlive individual requests.
pub struct SchedulingState {
    pub availability: AvailabilityService,
    pub booking: BookingService,
}

impl SchedulingState {
    pub fn new(store: Arc<dyn SchedulingStore>, config: &AppConfig) -> Self {
        Self {
            availability: AvailabilityService::new(
                Arc::clone(&store),
                config.default_slot_minutes,
            ),
            booking: BookingService::new(store),
        }
    }
}

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/availability", get(handlers::get_availability))
        .route(
            "/appointments",
            post(handlers::book_appointment).get(handlers::get_day_schedule),
        )
        .route("/appointments/{id}", get(handlers::get_appointment))
        .route(
            "/appointments/{id}/status",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/appointments/{id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route(
            "/appointments/{id}/cancel",
            post(handlers::cancel_appointment),
        )
        .with_state(state)
}
