// libs/directory-cell/src/services/holiday.rs
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info};

use shared_database::store::from_document;
use shared_database::{Document, DocumentStore, Filter, StoreError};

use crate::models::{CreateHolidayRequest, DirectoryError, Holiday};

const HOLIDAYS: &str = "holidays";

/// Blackout dates on which no appointment may be requested.
pub struct HolidayService {
    store: Arc<dyn DocumentStore>,
}

impl HolidayService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_holidays(&self) -> Result<Vec<Holiday>, DirectoryError> {
        let mut holidays: Vec<Holiday> = self
            .store
            .find(HOLIDAYS, &[])
            .await?
            .into_iter()
            .map(from_document)
            .collect::<Result<_, _>>()?;
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    /// The holiday falling on `date`, if any.
    pub async fn find_on(&self, date: NaiveDate) -> Result<Option<Holiday>, StoreError> {
        debug!("Checking holiday set for {}", date);
        self.store
            .find(HOLIDAYS, &[Filter::eq("date", date)])
            .await?
            .into_iter()
            .next()
            .map(from_document)
            .transpose()
    }

    pub async fn create_holiday(&self, request: CreateHolidayRequest) -> Result<Holiday, DirectoryError> {
        let label = request.label.trim();
        if label.is_empty() {
            return Err(DirectoryError::ValidationError("Holiday label is required".to_string()));
        }

        if let Some(existing) = self.find_on(request.date).await? {
            return Err(DirectoryError::Duplicate(format!(
                "{} is already marked as {}",
                existing.date, existing.label
            )));
        }

        let mut fields = Document::new();
        fields.insert("date".to_string(), json!(request.date));
        fields.insert("label".to_string(), json!(label));
        let id = self.store.create(HOLIDAYS, fields).await?;

        info!("Added holiday {} ({})", request.date, label);
        Ok(Holiday {
            id,
            date: request.date,
            label: label.to_string(),
        })
    }

    pub async fn delete_holiday(&self, id: &str) -> Result<(), DirectoryError> {
        self.store.delete(HOLIDAYS, id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => DirectoryError::NotFound(format!("Holiday {}", id)),
            other => other.into(),
        })
    }
}
