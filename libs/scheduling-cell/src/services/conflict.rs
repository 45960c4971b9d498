// libs/scheduling-cell/src/services/conflict.rs
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::SchedulingError;
use crate::store::SchedulingStore;

/// Half-open interval intersection: [a_start, a_end) and [b_start, b_end)
/// overlap iff each starts before the other ends. Back-to-back intervals
/// (one ending exactly when the other starts) do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// The one overlap check used by availability, creation and rescheduling.
/// Occupied time for a professional is the union of their active
/// appointments and any applicable blocks.
pub struct ConflictChecker {
    store: Arc<dyn SchedulingStore>,
}

impl ConflictChecker {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Occupied intervals for a professional on a day: active appointment
    /// intervals (optionally excluding one appointment, for reschedules)
    /// plus block intervals.
    pub async fn occupied_intervals(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>, SchedulingError> {
        let appointments = self
            .store
            .active_appointments_on(professional_id, date)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        let blocks = self
            .store
            .blocks_on(professional_id, date)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        let mut occupied: Vec<(DateTime<Utc>, DateTime<Utc>)> = appointments
            .iter()
            .filter(|apt| Some(apt.id) != exclude_appointment_id)
            .map(|apt| (apt.starts_at, apt.ends_at()))
            .chain(blocks.iter().map(|block| (block.starts_at, block.ends_at)))
            .collect();

        occupied.sort_by_key(|(start, _)| *start);
        Ok(occupied)
    }

    /// True when [start, end) intersects any occupied interval for the
    /// professional. Checks every calendar day the interval touches.
    pub async fn has_conflict(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, SchedulingError> {
        debug!(
            "Checking conflicts for professional {} from {} to {}",
            professional_id, start, end
        );

        // Walk every calendar day the interval touches; occupied intervals
        // are fetched per day, so skipping one would hide bookings that lie
        // entirely within it.
        let last_date = (end - chrono::Duration::nanoseconds(1)).date_naive();
        let dates = start
            .date_naive()
            .iter_days()
            .take_while(|date| *date <= last_date);

        for date in dates {
            let occupied = self
                .occupied_intervals(professional_id, date, exclude_appointment_id)
                .await?;

            if occupied
                .iter()
                .any(|(busy_start, busy_end)| intervals_overlap(start, end, *busy_start, *busy_end))
            {
                warn!(
                    "Conflict detected for professional {} at {}",
                    professional_id, start
                );
                return Ok(true);
            }
        }

        Ok(false)
    }
}
