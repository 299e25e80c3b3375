// libs/directory-cell/src/services/catalog.rs
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use shared_database::store::from_document;
use shared_database::{Document, DocumentStore, Filter, StoreError};

use crate::models::{DirectoryError, OfficeName, ServiceOffering, ServiceRequest};

const SERVICES: &str = "services";

/// Services each office offers, with optional rich-text requirements.
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_services(&self, office: Option<OfficeName>) -> Result<Vec<ServiceOffering>, DirectoryError> {
        let filters: Vec<Filter> = office.into_iter().map(|o| Filter::eq("office", o)).collect();
        let mut services: Vec<ServiceOffering> = self
            .store
            .find(SERVICES, &filters)
            .await?
            .into_iter()
            .map(from_document)
            .collect::<Result<_, _>>()?;

        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    pub async fn create_service(&self, request: ServiceRequest) -> Result<ServiceOffering, DirectoryError> {
        let fields = Self::validate(&request)?;
        let id = self.store.create(SERVICES, fields).await?;
        info!("Created service '{}' for {}", request.name.trim(), request.office);

        Ok(ServiceOffering {
            id,
            name: request.name.trim().to_string(),
            office: request.office,
            requirements: request.requirements,
        })
    }

    pub async fn update_service(&self, id: &str, request: ServiceRequest) -> Result<ServiceOffering, DirectoryError> {
        let fields = Self::validate(&request)?;
        self.store.update(SERVICES, id, fields).await.map_err(|e| match e {
            StoreError::NotFound { .. } => DirectoryError::NotFound(format!("Service {}", id)),
            other => other.into(),
        })?;

        Ok(ServiceOffering {
            id: id.to_string(),
            name: request.name.trim().to_string(),
            office: request.office,
            requirements: request.requirements,
        })
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), DirectoryError> {
        self.store.delete(SERVICES, id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => DirectoryError::NotFound(format!("Service {}", id)),
            other => other.into(),
        })
    }

    fn validate(request: &ServiceRequest) -> Result<Document, DirectoryError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DirectoryError::ValidationError("Service name is required".to_string()));
        }
        if !request.office.is_bookable() {
            return Err(DirectoryError::ValidationError(format!(
                "{} does not offer services",
                request.office
            )));
        }

        let mut fields = Document::new();
        fields.insert("name".to_string(), json!(name));
        fields.insert("office".to_string(), json!(request.office));
        fields.insert(
            "requirements".to_string(),
            request.requirements.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Ok(fields)
    }
}
