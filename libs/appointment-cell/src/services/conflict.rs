// libs/appointment-cell/src/services/conflict.rs
use chrono::NaiveDate;
use tracing::debug;

use shared_database::{Filter, StoreError};

use crate::models::{AppointmentStatus, Slot, TimeRange, SLOT_CAPACITY};
use crate::services::repository::{approved_in_slot, AppointmentRepository};

/// Slot occupancy and per-requester duplicate checks.
pub struct ConflictDetectionService {
    repository: AppointmentRepository,
}

impl ConflictDetectionService {
    pub fn new(repository: AppointmentRepository) -> Self {
        Self { repository }
    }

    /// Number of approved appointments occupying `slot`. Only approved ones count.
    pub async fn count_approved(&self, slot: &Slot) -> Result<usize, StoreError> {
        let count = self.repository.find(&approved_in_slot(slot)).await?.len();
        debug!(
            "{} approved in {} {} {}",
            count, slot.office, slot.date, slot.time_range
        );
        Ok(count)
    }

    pub async fn has_capacity(&self, slot: &Slot) -> Result<bool, StoreError> {
        Ok(self.count_approved(slot).await? < SLOT_CAPACITY)
    }

    /// Whether the requester already holds an approved appointment at this date and
    /// time range, in any office.
    pub async fn has_conflicting_approved(
        &self,
        requester_id: &str,
        date: NaiveDate,
        time_range: TimeRange,
        exclude_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let filters = [
            Filter::eq("requester_id", requester_id),
            Filter::eq("selected_date", date),
            Filter::eq("time_range", time_range),
            Filter::eq("status", AppointmentStatus::Approved),
        ];

        let existing = self.repository.find(&filters).await?;
        Ok(existing
            .iter()
            .any(|appointment| Some(appointment.id.as_str()) != exclude_id))
    }
}
