// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub price: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Scheduled end time, exclusive: the interval is [starts_at, ends_at).
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Active appointments occupy their interval for conflict purposes.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
                | AppointmentStatus::InProgress
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// An administrator-defined interval during which booking is disallowed.
/// A block without a professional applies to every professional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub professional_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub reason: Option<String>,
}

impl Block {
    pub fn applies_to(&self, professional_id: Uuid) -> bool {
        self.professional_id.is_none() || self.professional_id == Some(professional_id)
    }
}

/// Catalog entry supplying duration and price at booking time. Appointments
/// copy both values, so later catalog edits never touch existing bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price: f64,
    pub active: bool,
}

/// Weekly working hours for a professional. `weekday` follows the 0 = Sunday
/// through 6 = Saturday convention. No entry for a weekday, or
/// `available == false`, means no slots that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub professional_id: Uuid,
    pub weekday: u8,
    pub opens_at: chrono::NaiveTime,
    pub closes_at: chrono::NaiveTime,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableSlot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub new_starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub slot_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayScheduleQuery {
    pub professional_id: Uuid,
    pub date: NaiveDate,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Requested slot conflicts with an existing appointment or block")]
    SlotConflict,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}
