// libs/scheduling-cell/src/store/memory.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Block, ServiceOffering, WorkingHours};
use crate::store::{day_bounds, SchedulingStore};

#[derive(Default)]
struct Inner {
    appointments: HashMap<Uuid, Appointment>,
    blocks: Vec<Block>,
    working_hours: HashMap<(Uuid, u8), WorkingHours>,
    services: HashMap<Uuid, ServiceOffering>,
    professionals: HashSet<Uuid>,
}

/// In-memory store used by tests and the default binary. All maps live
/// behind a single RwLock; guards are never held across an await point.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_professional(&self, professional_id: Uuid) {
        let mut inner = self.inner.write().unwrap();
        inner.professionals.insert(professional_id);
    }

    pub fn add_working_hours(&self, hours: WorkingHours) {
        let mut inner = self.inner.write().unwrap();
        inner.professionals.insert(hours.professional_id);
        inner
            .working_hours
            .insert((hours.professional_id, hours.weekday), hours);
    }

    pub fn add_service(&self, service: ServiceOffering) {
        let mut inner = self.inner.write().unwrap();
        inner.services.insert(service.id, service);
    }

    pub fn add_block(&self, block: Block) {
        let mut inner = self.inner.write().unwrap();
        inner.blocks.push(block);
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn active_appointments_on(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let (day_start, day_end) = day_bounds(date);
        let inner = self.inner.read().unwrap();

        let mut appointments: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|apt| {
                apt.professional_id == professional_id
                    && apt.status.is_active()
                    && apt.starts_at < day_end
                    && apt.ends_at() > day_start
            })
            .cloned()
            .collect();

        appointments.sort_by_key(|apt| apt.starts_at);
        Ok(appointments)
    }

    async fn blocks_on(&self, professional_id: Uuid, date: NaiveDate) -> Result<Vec<Block>> {
        let (day_start, day_end) = day_bounds(date);
        let inner = self.inner.read().unwrap();

        let mut blocks: Vec<Block> = inner
            .blocks
            .iter()
            .filter(|block| {
                block.applies_to(professional_id)
                    && block.starts_at < day_end
                    && block.ends_at > day_start
            })
            .cloned()
            .collect();

        blocks.sort_by_key(|block| block.starts_at);
        Ok(blocks)
    }

    async fn working_hours_for(
        &self,
        professional_id: Uuid,
        weekday: u8,
    ) -> Result<Option<WorkingHours>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.working_hours.get(&(professional_id, weekday)).cloned())
    }

    async fn service_offering(&self, service_id: Uuid) -> Result<Option<ServiceOffering>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.services.get(&service_id).cloned())
    }

    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner.professionals.contains(&professional_id))
    }

    async fn appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.appointments.get(&id).cloned())
    }

    async fn appointments_for_day(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let (day_start, day_end) = day_bounds(date);
        let inner = self.inner.read().unwrap();

        let mut appointments: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|apt| {
                apt.professional_id == professional_id
                    && apt.starts_at < day_end
                    && apt.ends_at() > day_start
            })
            .cloned()
            .collect();

        appointments.sort_by_key(|apt| apt.starts_at);
        Ok(appointments)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let appointment = inner
            .appointments
            .get_mut(&id)
            .ok_or_else(|| anyhow!("appointment {} does not exist", id))?;

        appointment.status = status;
        if notes.is_some() {
            appointment.notes = notes;
        }
        appointment.updated_at = updated_at;
        Ok(())
    }

    async fn update_start(
        &self,
        id: Uuid,
        starts_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let appointment = inner
            .appointments
            .get_mut(&id)
            .ok_or_else(|| anyhow!("appointment {} does not exist", id))?;

        appointment.starts_at = starts_at;
        appointment.updated_at = updated_at;
        Ok(())
    }
}
