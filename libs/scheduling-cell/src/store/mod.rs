// libs/scheduling-cell/src/store/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Block, ServiceOffering, WorkingHours};

pub mod memory;

pub use memory::InMemoryStore;

/// Persistence seam for the scheduling cell. Injected as
/// `Arc<dyn SchedulingStore>` so tests and the binary can run against the
/// in-memory implementation while production swaps in a relational store.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    /// Non-cancelled appointments for a professional whose interval touches
    /// the given calendar day, ascending by start time.
    async fn active_appointments_on(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>>;

    /// Blocks overlapping the given day that apply to the professional,
    /// including global blocks.
    async fn blocks_on(&self, professional_id: Uuid, date: NaiveDate) -> Result<Vec<Block>>;

    async fn working_hours_for(
        &self,
        professional_id: Uuid,
        weekday: u8,
    ) -> Result<Option<WorkingHours>>;

    async fn service_offering(&self, service_id: Uuid) -> Result<Option<ServiceOffering>>;

    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool>;

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// Every appointment for a professional on a day regardless of status,
    /// ascending by start time.
    async fn appointments_for_day(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>>;

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<()>;

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn update_start(
        &self,
        id: Uuid,
        starts_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// UTC bounds of a calendar day as a half-open interval.
pub(crate) fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    (start, start + chrono::Duration::days(1))
}
