// libs/appointment-cell/src/services/repository.rs
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use tracing::debug;

use directory_cell::OfficeName;
use shared_database::store::{from_document, to_document};
use shared_database::{CapacityGuard, DocumentStore, Filter, StoreError};

use crate::models::{
    Appointment, AppointmentStatus, AuditLogEntry, Slot, TimeRange, REQUESTER_GUARD, SLOT_CAPACITY, SLOT_GUARD,
};

pub const APPOINTMENTS: &str = "appointments";
pub const LOGS: &str = "logs";

/// Typed access to the appointment and audit log collections.
#[derive(Clone)]
pub struct AppointmentRepository {
    store: Arc<dyn DocumentStore>,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Appointment>, StoreError> {
        self.store
            .get(APPOINTMENTS, id)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn find(&self, filters: &[Filter]) -> Result<Vec<Appointment>, StoreError> {
        debug!("Querying appointments with {} filters", filters.len());
        self.store
            .find(APPOINTMENTS, filters)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn find_in_range(
        &self,
        office: Option<OfficeName>,
        start: NaiveDate,
        end: NaiveDate,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut filters = vec![
            Filter::gte("selected_date", start),
            Filter::lte("selected_date", end),
        ];
        if let Some(office) = office {
            filters.push(Filter::eq("office", office));
        }
        if let Some(status) = status {
            filters.push(Filter::eq("status", status));
        }
        self.find(&filters).await
    }

    /// Insert a new appointment. With `guards`, the insert only happens while every guard has room.
    pub async fn insert(&self, appointment: &Appointment, guards: &[CapacityGuard]) -> Result<String, StoreError> {
        let doc = to_document(appointment)?;
        if guards.is_empty() {
            self.store.create(APPOINTMENTS, doc).await
        } else {
            self.store.create_guarded(APPOINTMENTS, doc, guards).await
        }
    }

    /// Move an appointment out of `expected` into `partial.status`, atomically.
    pub async fn transition(
        &self,
        id: &str,
        expected: AppointmentStatus,
        partial: Map<String, Value>,
        guards: &[CapacityGuard],
    ) -> Result<(), StoreError> {
        self.store
            .update_guarded(APPOINTMENTS, id, &[Filter::eq("status", expected)], partial, guards)
            .await
    }

    pub async fn log_completion(&self, entry: &AuditLogEntry) -> Result<String, StoreError> {
        self.store.create(LOGS, to_document(entry)?).await
    }
}

/// Filters selecting the approved appointments that occupy `slot`.
pub fn approved_in_slot(slot: &Slot) -> Vec<Filter> {
    vec![
        Filter::eq("office", slot.office),
        Filter::eq("selected_date", slot.date),
        Filter::eq("time_range", slot.time_range),
        Filter::eq("status", AppointmentStatus::Approved),
    ]
}

pub fn slot_guard(slot: &Slot) -> CapacityGuard {
    CapacityGuard::new(SLOT_GUARD, approved_in_slot(slot), SLOT_CAPACITY)
}

/// At most one approved appointment per requester for a date and time range, in any office.
pub fn requester_guard(requester_id: &str, date: NaiveDate, time_range: TimeRange) -> CapacityGuard {
    CapacityGuard::new(
        REQUESTER_GUARD,
        vec![
            Filter::eq("requester_id", requester_id),
            Filter::eq("selected_date", date),
            Filter::eq("time_range", time_range),
            Filter::eq("status", AppointmentStatus::Approved),
        ],
        1,
    )
}

/// Both guards an approval has to pass.
pub fn approval_guards(appointment: &Appointment) -> [CapacityGuard; 2] {
    [
        slot_guard(&appointment.slot()),
        requester_guard(&appointment.requester_id, appointment.selected_date, appointment.time_range),
    ]
}

/// Partial document for a status change. `extra` must be a JSON object.
pub fn status_patch(status: AppointmentStatus, extra: Value) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("status".to_string(), json!(status));
    if let Value::Object(fields) = extra {
        patch.extend(fields);
    }
    patch
}
