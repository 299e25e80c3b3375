// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use directory_cell::OfficeName;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, CalendarQuery, DeclineAppointmentRequest, OfficeAppointmentsQuery,
    OfficeSuspensionRequest, SlotCountQuery, SubmitAppointmentRequest, WorkflowOutcome, SLOT_CAPACITY,
};
use crate::router::AppointmentState;

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::MissingFields(_)
            | AppointmentError::LeadTimeViolation
            | AppointmentError::WeekendBlocked
            | AppointmentError::HolidayBlocked(_)
            | AppointmentError::ValidationError(_) => AppError::ValidationError(e.to_string()),
            AppointmentError::SlotFull
            | AppointmentError::DuplicateBooking
            | AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(e.to_string()),
            AppointmentError::NotFound => AppError::NotFound(e.to_string()),
            AppointmentError::Unauthorized(msg) => AppError::Forbidden(msg),
            AppointmentError::StoreUnavailable(msg) => AppError::Database(msg),
        }
    }
}

fn outcome_body(outcome: WorkflowOutcome, message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "code": outcome.appointment.display_code(),
        "appointment": outcome.appointment,
        "warnings": outcome.warnings,
        "message": message
    }))
}

// ==============================================================================
// REQUESTER HANDLERS
// ==============================================================================

pub async fn submit_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.workflow.submit(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "code": appointment.display_code(),
            "appointment": appointment,
            "message": "Appointment request submitted"
        })),
    ))
}

pub async fn list_my_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.workflow.list_mine(&user).await?;
    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.workflow.get(&user, &appointment_id).await?;
    Ok(Json(json!({
        "code": appointment.display_code(),
        "appointment": appointment
    })))
}

pub async fn get_appointment_slip(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let slip = state.workflow.slip(&user, &appointment_id).await?;
    let printable = slip.render();
    Ok(Json(json!({
        "slip": slip,
        "printable": printable
    })))
}

pub async fn get_slot_count(
    State(state): State<AppointmentState>,
    Query(query): Query<SlotCountQuery>,
) -> Result<Json<Value>, AppError> {
    let count = state
        .workflow
        .count_approved(query.office, query.date, query.time_range)
        .await?;

    Ok(Json(json!({
        "office": query.office,
        "date": query.date,
        "time_range": query.time_range,
        "approved": count,
        "capacity": SLOT_CAPACITY,
        "available": count < SLOT_CAPACITY
    })))
}

// ==============================================================================
// OFFICE HANDLERS
// ==============================================================================

pub async fn list_office_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(office): Path<String>,
    Query(query): Query<OfficeAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let office: OfficeName = office.parse()?;
    let appointments = state
        .workflow
        .list_for_office(&user, office, query.status)
        .await?;

    Ok(Json(json!({
        "office": office,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_calendar(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .workflow
        .calendar(&user, query.start, query.end, query.office)
        .await?;

    Ok(Json(json!({
        "start": query.start,
        "end": query.end,
        "appointments": appointments
    })))
}

pub async fn approve_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.workflow.approve(&user, &appointment_id).await?;
    Ok(outcome_body(outcome, "Appointment approved"))
}

pub async fn decline_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<DeclineAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = state
        .workflow
        .decline(&user, &appointment_id, &request.reason)
        .await?;
    Ok(outcome_body(outcome, "Appointment declined"))
}

pub async fn complete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.workflow.complete(&user, &appointment_id).await?;
    Ok(outcome_body(outcome, "Appointment completed"))
}

pub async fn suspend_office(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<OfficeSuspensionRequest>,
) -> Result<Json<Value>, AppError> {
    let report = state.workflow.bulk_decline_by_date_range(&user, &request).await?;

    Ok(Json(json!({
        "success": true,
        "office": request.office,
        "declined": report.declined,
        "report": report
    })))
}
