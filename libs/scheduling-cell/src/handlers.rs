// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    AvailabilityQuery, BookAppointmentRequest, CancelAppointmentRequest, DayScheduleQuery,
    RescheduleRequest, SchedulingError, UpdateStatusRequest,
};
use crate::router::SchedulingState;

fn into_app_error(error: SchedulingError) -> AppError {
    let message = error.to_string();
    match error {
        SchedulingError::InvalidInput(_) => AppError::BadRequest(message),
        SchedulingError::SlotConflict => AppError::Conflict(message),
        SchedulingError::InvalidTransition(_) => AppError::BadRequest(message),
        SchedulingError::NotFound(_) => AppError::NotFound(message),
        SchedulingError::Store(_) => AppError::Database(message),
    }
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .availability
        .available_slots(query.professional_id, query.date, query.slot_minutes)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "professional_id": query.professional_id,
        "date": query.date,
        "slots": slots
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state
        .booking
        .book_appointment(request)
        .await
        .map_err(into_app_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .get_appointment(appointment_id)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn get_day_schedule(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<DayScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .booking
        .day_schedule(query.professional_id, query.date)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "professional_id": query.professional_id,
        "date": query.date,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .transition(appointment_id, request.status)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .reschedule(appointment_id, request.new_starts_at)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .booking
        .cancel(appointment_id, request.reason)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}
