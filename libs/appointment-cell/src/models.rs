// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use directory_cell::OfficeName;
use notification_cell::AppointmentNotice;
use shared_database::StoreError;
use shared_models::Role;

/// Maximum number of approved appointments per (office, date, time range).
pub const SLOT_CAPACITY: usize = 4;

/// Names of the capacity guards appointment writes carry.
pub const SLOT_GUARD: &str = "slot";
pub const REQUESTER_GUARD: &str = "requester_slot";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub requester_id: String,
    pub kind: AppointmentKind,
    pub selected_date: NaiveDate,
    pub time_range: TimeRange,
    pub office: OfficeName,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub personnel: Option<String>,
    #[serde(default)]
    pub reason: String,
    pub requester_name: String,
    #[serde(default)]
    pub requester_contact: String,
    #[serde(default)]
    pub requester_email: String,
    pub requester_role: Role,
    pub created_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub decline_reason: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// User-visible code: office code followed by the id, uppercased.
    pub fn display_code(&self) -> String {
        format_display_code(self.office, &self.id)
    }

    pub fn slot(&self) -> Slot {
        Slot {
            office: self.office,
            date: self.selected_date,
            time_range: self.time_range,
        }
    }

    pub fn notice(&self) -> AppointmentNotice {
        AppointmentNotice {
            requester_name: self.requester_name.clone(),
            code: self.display_code(),
            office: self.office.to_string(),
            date: self.selected_date,
            time_range: self.time_range.to_string(),
        }
    }
}

pub fn format_display_code(office: OfficeName, id: &str) -> String {
    format!("{}{}", office.code(), id).to_uppercase()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Declined,
    Completed,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Declined | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Approved => write!(f, "approved"),
            AppointmentStatus::Declined => write!(f, "declined"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    Service,
    Visit,
}

/// Bookable hourly slots. Noon to 1pm is the lunch break and is never offered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeRange {
    #[serde(rename = "8:00am-9:00am")]
    EightToNine,
    #[serde(rename = "9:00am-10:00am")]
    NineToTen,
    #[serde(rename = "10:00am-11:00am")]
    TenToEleven,
    #[serde(rename = "11:00am-12:00pm")]
    ElevenToNoon,
    #[serde(rename = "1:00pm-2:00pm")]
    OneToTwo,
    #[serde(rename = "2:00pm-3:00pm")]
    TwoToThree,
    #[serde(rename = "3:00pm-4:00pm")]
    ThreeToFour,
    #[serde(rename = "4:00pm-5:00pm")]
    FourToFive,
}

impl TimeRange {
    pub const ALL: [TimeRange; 8] = [
        TimeRange::EightToNine,
        TimeRange::NineToTen,
        TimeRange::TenToEleven,
        TimeRange::ElevenToNoon,
        TimeRange::OneToTwo,
        TimeRange::TwoToThree,
        TimeRange::ThreeToFour,
        TimeRange::FourToFive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::EightToNine => "8:00am-9:00am",
            TimeRange::NineToTen => "9:00am-10:00am",
            TimeRange::TenToEleven => "10:00am-11:00am",
            TimeRange::ElevenToNoon => "11:00am-12:00pm",
            TimeRange::OneToTwo => "1:00pm-2:00pm",
            TimeRange::TwoToThree => "2:00pm-3:00pm",
            TimeRange::ThreeToFour => "3:00pm-4:00pm",
            TimeRange::FourToFive => "4:00pm-5:00pm",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|range| range.as_str() == s.trim())
            .ok_or_else(|| AppointmentError::ValidationError(format!("Unknown time range: {}", s)))
    }
}

/// Capacity partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub office: OfficeName,
    pub date: NaiveDate,
    pub time_range: TimeRange,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Submission as received from the requester. Required fields are optional here
/// so that their absence is reported as a validation rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitAppointmentRequest {
    pub kind: Option<AppointmentKind>,
    pub selected_date: Option<NaiveDate>,
    pub time_range: Option<TimeRange>,
    pub office: Option<OfficeName>,
    pub service: Option<String>,
    pub personnel: Option<String>,
    pub reason: Option<String>,
    pub requester_name: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

/// A submission bound to the requester who made it.
#[derive(Debug, Clone)]
pub struct AppointmentCandidate {
    pub requester_id: String,
    pub requester_role: Role,
    pub requester_name: String,
    pub requester_contact: String,
    pub requester_email: String,
    pub request: SubmitAppointmentRequest,
}

/// A candidate that passed every submission check.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub requester_id: String,
    pub requester_role: Role,
    pub requester_name: String,
    pub requester_contact: String,
    pub requester_email: String,
    pub kind: AppointmentKind,
    pub slot: Slot,
    pub service: Option<String>,
    pub personnel: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficeSuspensionRequest {
    pub office: OfficeName,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub office: Option<OfficeName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotCountQuery {
    pub office: OfficeName,
    pub date: NaiveDate,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfficeAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
}

/// Non-fatal problems raised after a status change was committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WorkflowWarning {
    NotificationSendFailed(String),
    FeedbackCreationFailed(String),
    AuditLogFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub appointment: Appointment,
    pub warnings: Vec<WorkflowWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkDeclineReport {
    pub matched: usize,
    pub declined: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub appointment_id: String,
    pub office: OfficeName,
    pub requester_name: String,
    pub appointment_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Appointments must be requested at least one full day in advance")]
    LeadTimeViolation,

    #[error("Appointments cannot be scheduled on weekends")]
    WeekendBlocked,

    #[error("No appointments can be scheduled on {0}")]
    HolidayBlocked(String),

    #[error("This time slot is already fully booked")]
    SlotFull,

    #[error("You already have an approved appointment at this date and time")]
    DuplicateBooking,

    #[error("Appointment not found")]
    NotFound,

    #[error("Cannot {action} an appointment that is {from}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        action: &'static str,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Directory store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for AppointmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } | StoreError::PreconditionFailed { .. } => AppointmentError::NotFound,
            StoreError::CapacityExceeded { guard, .. } if guard == REQUESTER_GUARD => AppointmentError::DuplicateBooking,
            StoreError::CapacityExceeded { .. } => AppointmentError::SlotFull,
            StoreError::Unavailable(msg) | StoreError::Malformed(msg) => AppointmentError::StoreUnavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requester_guard_maps_to_duplicate_booking() {
        let full = |guard: &str| StoreError::CapacityExceeded { guard: guard.to_string(), limit: 1 };
        assert!(matches!(AppointmentError::from(full(REQUESTER_GUARD)), AppointmentError::DuplicateBooking));
        assert!(matches!(AppointmentError::from(full(SLOT_GUARD)), AppointmentError::SlotFull));
    }

    #[test]
    fn display_code_is_uppercased() {
        assert_eq!(format_display_code(OfficeName::Registrar, "aB3xQ"), "REGAB3XQ");
        assert_eq!(format_display_code(OfficeName::BsbaFmFaculty, "x1"), "BSBAFMX1");
    }

    #[test]
    fn time_ranges_use_exact_keys_and_skip_lunch() {
        let keys: Vec<_> = TimeRange::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(keys.len(), 8);
        assert!(!keys.iter().any(|k| k.starts_with("12:00pm")));
        assert_eq!(
            serde_json::to_string(&TimeRange::ElevenToNoon).unwrap(),
            "\"11:00am-12:00pm\""
        );
        assert_eq!("1:00pm-2:00pm".parse::<TimeRange>().unwrap(), TimeRange::OneToTwo);
        assert!("12:00pm-1:00pm".parse::<TimeRange>().is_err());
    }

    #[test]
    fn missing_fields_message_lists_names() {
        let err = AppointmentError::MissingFields(vec!["kind".into(), "office".into()]);
        assert_eq!(err.to_string(), "Missing required fields: kind, office");
    }
}
