// libs/scheduling-cell/src/services/availability.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AvailableSlot, SchedulingError};
use crate::services::conflict::{intervals_overlap, ConflictChecker};
use crate::store::SchedulingStore;

pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    conflict: ConflictChecker,
    default_slot_minutes: i64,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, default_slot_minutes: i64) -> Self {
        let conflict = ConflictChecker::new(Arc::clone(&store));
        Self {
            store,
            conflict,
            default_slot_minutes,
        }
    }

    /// Bookable slot start times for a professional on a date.
    ///
    /// Candidates are generated at `slot_minutes` increments within the
    /// professional's working hours for that weekday; a candidate survives
    /// only if its whole [start, start + slot_minutes) interval fits before
    /// closing and touches no active appointment or block. No working-hours
    /// entry (or one flagged unavailable) yields an empty list, not an error.
    pub async fn available_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        slot_minutes: Option<i64>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        let slot_minutes = slot_minutes.unwrap_or(self.default_slot_minutes);
        if slot_minutes < 1 {
            return Err(SchedulingError::InvalidInput(format!(
                "Slot length must be at least 1 minute, got {}",
                slot_minutes
            )));
        }

        let exists = self
            .store
            .professional_exists(professional_id)
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;
        if !exists {
            return Err(SchedulingError::NotFound("Professional".to_string()));
        }

        debug!(
            "Calculating available slots for professional {} on {} ({} min granularity)",
            professional_id, date, slot_minutes
        );

        let hours = self
            .store
            .working_hours_for(professional_id, weekday_index(date))
            .await
            .map_err(|e| SchedulingError::Store(e.to_string()))?;

        let hours = match hours {
            Some(hours) if hours.available => hours,
            _ => {
                debug!(
                    "Professional {} has no working hours on {}",
                    professional_id, date
                );
                return Ok(vec![]);
            }
        };

        let opens_at = date.and_time(hours.opens_at).and_utc();
        let closes_at = date.and_time(hours.closes_at).and_utc();
        let occupied = self
            .conflict
            .occupied_intervals(professional_id, date, None)
            .await?;

        let step = Duration::minutes(slot_minutes);
        let mut slots = Vec::new();
        let mut current = opens_at;

        while current + step <= closes_at {
            let slot_end = current + step;

            let busy = occupied
                .iter()
                .any(|(busy_start, busy_end)| {
                    intervals_overlap(current, slot_end, *busy_start, *busy_end)
                });

            if !busy {
                slots.push(AvailableSlot {
                    starts_at: current,
                    ends_at: slot_end,
                    duration_minutes: slot_minutes,
                });
            }

            current += step;
        }

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }
}

/// 0 = Sunday through 6 = Saturday.
fn weekday_index(date: NaiveDate) -> u8 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}
