// libs/directory-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::Capability;

use crate::models::{
    ChangeRoleRequest, CreateHolidayRequest, DirectoryError, OfficeName, ServiceQuery,
    ServiceRequest, UpdateOfficeRequest,
};
use crate::router::DirectoryState;
use crate::services::{AccountService, CatalogService, HolidayService, OfficeService};

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::UnknownOffice(_) | DirectoryError::ValidationError(_) => {
                AppError::ValidationError(e.to_string())
            }
            DirectoryError::NotFound(_) => AppError::NotFound(e.to_string()),
            DirectoryError::Duplicate(_) | DirectoryError::InvalidRoleTransition { .. } => {
                AppError::Conflict(e.to_string())
            }
            DirectoryError::Unauthorized(msg) => AppError::Forbidden(msg),
            DirectoryError::Store(store) => AppError::Database(store.to_string()),
        }
    }
}

fn require_directory_admin(user: &User) -> Result<(), AppError> {
    if user.can(Capability::ManageDirectory) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only administrators can change directory settings".to_string()))
    }
}

fn parse_office(raw: &str) -> Result<OfficeName, AppError> {
    raw.parse::<OfficeName>().map_err(AppError::from)
}

// ==============================================================================
// OFFICES
// ==============================================================================

pub async fn list_offices(State(state): State<DirectoryState>) -> Result<Json<Value>, AppError> {
    let offices = OfficeService::new(state.store.clone()).list_offices().await?;
    Ok(Json(json!({ "offices": offices })))
}

pub async fn get_office(
    State(state): State<DirectoryState>,
    Path(office): Path<String>,
) -> Result<Json<Value>, AppError> {
    let office = parse_office(&office)?;
    let settings = OfficeService::new(state.store.clone()).get_office(office).await?;
    Ok(Json(json!({ "office": settings, "code": office.code() })))
}

pub async fn update_office(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Path(office): Path<String>,
    Json(request): Json<UpdateOfficeRequest>,
) -> Result<Json<Value>, AppError> {
    require_directory_admin(&user)?;
    let office = parse_office(&office)?;
    let settings = OfficeService::new(state.store.clone())
        .upsert_office(office, request)
        .await?;
    Ok(Json(json!({ "success": true, "office": settings })))
}

// ==============================================================================
// SERVICES
// ==============================================================================

pub async fn list_services(
    State(state): State<DirectoryState>,
    Query(query): Query<ServiceQuery>,
) -> Result<Json<Value>, AppError> {
    let services = CatalogService::new(state.store.clone())
        .list_services(query.office)
        .await?;
    Ok(Json(json!({ "services": services })))
}

pub async fn create_service(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Json(request): Json<ServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_directory_admin(&user)?;
    let service = CatalogService::new(state.store.clone()).create_service(request).await?;
    Ok(Json(json!({ "success": true, "service": service })))
}

pub async fn update_service(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
    Json(request): Json<ServiceRequest>,
) -> Result<Json<Value>, AppError> {
    require_directory_admin(&user)?;
    let service = CatalogService::new(state.store.clone())
        .update_service(&service_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "service": service })))
}

pub async fn delete_service(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_directory_admin(&user)?;
    CatalogService::new(state.store.clone()).delete_service(&service_id).await?;
    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// HOLIDAYS
// ==============================================================================

pub async fn list_holidays(State(state): State<DirectoryState>) -> Result<Json<Value>, AppError> {
    let holidays = HolidayService::new(state.store.clone()).list_holidays().await?;
    Ok(Json(json!({ "holidays": holidays })))
}

pub async fn create_holiday(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateHolidayRequest>,
) -> Result<Json<Value>, AppError> {
    require_directory_admin(&user)?;
    let holiday = HolidayService::new(state.store.clone()).create_holiday(request).await?;
    Ok(Json(json!({ "success": true, "holiday": holiday })))
}

pub async fn delete_holiday(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Path(holiday_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_directory_admin(&user)?;
    HolidayService::new(state.store.clone()).delete_holiday(&holiday_id).await?;
    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// ACCOUNTS
// ==============================================================================

pub async fn get_account(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.id != user_id && !user.can(Capability::ManageDirectory) {
        return Err(AppError::Forbidden("Not authorized to view this account".to_string()));
    }
    let account = AccountService::new(state.store.clone()).get_account(&user_id).await?;
    Ok(Json(json!(account)))
}

pub async fn change_account_role(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Path(user_id): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<Value>, AppError> {
    let account = AccountService::new(state.store.clone())
        .change_role(&user, &user_id, request.role)
        .await?;
    Ok(Json(json!({ "success": true, "account": account })))
}
