// libs/scheduling-cell/src/services/booking.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, SchedulingError,
};
use crate::services::conflict::ConflictChecker;
use crate::services::lifecycle::LifecycleService;
use crate::store::SchedulingStore;

/// Creates, transitions and reschedules appointments while enforcing the
/// non-overlap invariant. The conflict check and the following write run
/// under a per-professional async lock, so two concurrent bookings for the
/// same professional serialize and at most one can claim an interval.
pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    conflict: ConflictChecker,
    lifecycle: LifecycleService,
    professional_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BookingService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        let conflict = ConflictChecker::new(Arc::clone(&store));
        Self {
            store,
            conflict,
            lifecycle: LifecycleService::new(),
            professional_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Book a new appointment. Duration and price come from the service
    /// catalog at this moment; the record is created in `scheduled` state.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for client {} with professional {}",
            request.client_id, request.professional_id
        );

        let exists = self
            .store
            .professional_exists(request.professional_id)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;
        if !exists {
            return Err(SchedulingError::NotFound("Professional".to_string()));
        }

        let service = self
            .store
            .service_offering(request.service_id)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?
            .ok_or_else(|| SchedulingError::NotFound("Service".to_string()))?;

        if !service.active {
            return Err(SchedulingError::InvalidInput(format!(
                "Service '{}' is no longer offered",
                service.name
            )));
        }
        if service.duration_minutes <= 0 {
            return Err(SchedulingError::InvalidInput(format!(
                "Service '{}' has a non-positive duration",
                service.name
            )));
        }

        let ends_at = request.starts_at + Duration::minutes(service.duration_minutes as i64);

        // Check-then-insert must be atomic per professional.
        let lock = self.professional_lock(request.professional_id).await;
        let _guard = lock.lock().await;

        let has_conflict = self
            .conflict
            .has_conflict(request.professional_id, request.starts_at, ends_at, None)
            .await?;
        if has_conflict {
            warn!(
                "Booking conflict for professional {} at {}",
                request.professional_id, request.starts_at
            );
            return Err(SchedulingError::SlotConflict);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: request.client_id,
            professional_id: request.professional_id,
            service_id: request.service_id,
            starts_at: request.starts_at,
            duration_minutes: service.duration_minutes,
            status: AppointmentStatus::Scheduled,
            price: service.price,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert_appointment(&appointment)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        info!(
            "Appointment {} booked with professional {}",
            appointment.id, appointment.professional_id
        );
        Ok(appointment)
    }

    /// Apply a status transition. An illegal edge fails without touching the
    /// stored status.
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Transitioning appointment {} to {}",
            appointment_id, new_status
        );

        let appointment = self.get_appointment(appointment_id).await?;
        let lock = self.professional_lock(appointment.professional_id).await;
        let _guard = lock.lock().await;

        // Re-read under the lock; a racing transition may have landed since
        // the first load.
        let mut appointment = self.get_appointment(appointment_id).await?;
        self.lifecycle
            .validate_transition(appointment.status, new_status)?;

        let now = Utc::now();
        self.store
            .update_status(appointment_id, new_status, None, now)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        appointment.status = new_status;
        appointment.updated_at = now;

        info!("Appointment {} is now {}", appointment_id, new_status);
        Ok(appointment)
    }

    /// Cancel an appointment. Cancellation is a status change, not removal;
    /// the freed interval immediately stops counting toward conflicts.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self.get_appointment(appointment_id).await?;
        let lock = self.professional_lock(appointment.professional_id).await;
        let _guard = lock.lock().await;

        let mut appointment = self.get_appointment(appointment_id).await?;
        self.lifecycle
            .validate_transition(appointment.status, AppointmentStatus::Cancelled)?;

        let now = Utc::now();
        self.store
            .update_status(
                appointment_id,
                AppointmentStatus::Cancelled,
                reason.clone(),
                now,
            )
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        appointment.status = AppointmentStatus::Cancelled;
        if reason.is_some() {
            appointment.notes = reason;
        }
        appointment.updated_at = now;

        info!("Appointment {} cancelled", appointment_id);
        Ok(appointment)
    }

    /// Move a non-terminal appointment to a new start time, keeping its
    /// duration and status. The appointment's own interval is excluded from
    /// the conflict check so shifting within it is allowed.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_starts_at: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Rescheduling appointment {} to {}",
            appointment_id, new_starts_at
        );

        let appointment = self.get_appointment(appointment_id).await?;
        let lock = self.professional_lock(appointment.professional_id).await;
        let _guard = lock.lock().await;

        let mut appointment = self.get_appointment(appointment_id).await?;
        if appointment.status.is_terminal() {
            warn!(
                "Reschedule rejected for appointment {} in status {}",
                appointment_id, appointment.status
            );
            return Err(SchedulingError::InvalidTransition(appointment.status));
        }

        let new_ends_at =
            new_starts_at + Duration::minutes(appointment.duration_minutes as i64);

        let has_conflict = self
            .conflict
            .has_conflict(
                appointment.professional_id,
                new_starts_at,
                new_ends_at,
                Some(appointment_id),
            )
            .await?;
        if has_conflict {
            warn!(
                "Reschedule conflict for appointment {} at {}",
                appointment_id, new_starts_at
            );
            return Err(SchedulingError::SlotConflict);
        }

        let now = Utc::now();
        self.store
            .update_start(appointment_id, new_starts_at, now)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        appointment.starts_at = new_starts_at;
        appointment.updated_at = now;

        info!(
            "Appointment {} rescheduled to {}",
            appointment_id, new_starts_at
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.store
            .appointment(appointment_id)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?
            .ok_or_else(|| SchedulingError::NotFound("Appointment".to_string()))
    }

    /// Full day schedule for a professional, any status.
    pub async fn day_schedule(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.store
            .appointments_for_day(professional_id, date)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))
    }

    async fn professional_lock(&self, professional_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.professional_locks.lock().await;
        Arc::clone(
            locks
                .entry(professional_id)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
