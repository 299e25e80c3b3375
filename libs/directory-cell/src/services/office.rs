// libs/directory-cell/src/services/office.rs
use std::sync::Arc;

use tracing::{debug, info};

use shared_database::store::{from_document, to_document};
use shared_database::{DocumentStore, Filter};

use crate::models::{DirectoryError, OfficeName, OfficeSettings, UpdateOfficeRequest};

const OFFICES: &str = "offices";

pub struct OfficeService {
    store: Arc<dyn DocumentStore>,
}

impl OfficeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Settings for every office; offices never configured come back blank.
    pub async fn list_offices(&self) -> Result<Vec<OfficeSettings>, DirectoryError> {
        let stored: Vec<OfficeSettings> = self
            .store
            .find(OFFICES, &[])
            .await?
            .into_iter()
            .map(from_document)
            .collect::<Result<_, _>>()?;

        Ok(OfficeName::ALL
            .into_iter()
            .map(|name| {
                stored
                    .iter()
                    .find(|settings| settings.name == name)
                    .cloned()
                    .unwrap_or_else(|| OfficeSettings::unconfigured(name))
            })
            .collect())
    }

    pub async fn get_office(&self, name: OfficeName) -> Result<OfficeSettings, DirectoryError> {
        debug!("Loading settings for {}", name);
        let found = self
            .store
            .find(OFFICES, &[Filter::eq("name", name)])
            .await?
            .into_iter()
            .next();

        match found {
            Some(doc) => Ok(from_document(doc)?),
            None => Ok(OfficeSettings::unconfigured(name)),
        }
    }

    pub async fn upsert_office(
        &self,
        name: OfficeName,
        request: UpdateOfficeRequest,
    ) -> Result<OfficeSettings, DirectoryError> {
        let phone_number = request.phone_number.trim().to_string();
        if !phone_number.is_empty() && !phone_number.chars().all(|c| c.is_ascii_digit() || c == '-' || c == ' ') {
            return Err(DirectoryError::ValidationError(
                "Phone number may only contain digits, spaces and dashes".to_string(),
            ));
        }

        let mut settings = OfficeSettings {
            id: None,
            name,
            phone_number,
            personnel_name: request.personnel_name.trim().to_string(),
        };
        let fields = to_document(&settings)?;

        let existing = self.get_office(name).await?;
        let id = match existing.id {
            Some(id) => {
                self.store.update(OFFICES, &id, fields).await?;
                id
            }
            None => self.store.create(OFFICES, fields).await?,
        };

        info!("Updated settings for {}", name);
        settings.id = Some(id);
        Ok(settings)
    }
}
