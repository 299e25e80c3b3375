// libs/directory-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::Role;

// ==============================================================================
// OFFICES
// ==============================================================================

/// The fixed set of campus offices. Referenced by name from appointments and services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfficeName {
    #[serde(rename = "Registrar Office")]
    Registrar,
    #[serde(rename = "Cashier")]
    Cashier,
    #[serde(rename = "Admission & Guidance")]
    AdmissionGuidance,
    #[serde(rename = "Student Affairs and Services")]
    StudentAffairs,
    #[serde(rename = "BSIT Faculty")]
    BsitFaculty,
    #[serde(rename = "BEED Faculty")]
    BeedFaculty,
    #[serde(rename = "BSBA OM Faculty")]
    BsbaOmFaculty,
    #[serde(rename = "BSBA FM Faculty")]
    BsbaFmFaculty,
    #[serde(rename = "BSOA Faculty")]
    BsoaFaculty,
    #[serde(rename = "Campus Director")]
    CampusDirector,
}

impl OfficeName {
    pub const ALL: [OfficeName; 10] = [
        OfficeName::Registrar,
        OfficeName::Cashier,
        OfficeName::AdmissionGuidance,
        OfficeName::StudentAffairs,
        OfficeName::BsitFaculty,
        OfficeName::BeedFaculty,
        OfficeName::BsbaOmFaculty,
        OfficeName::BsbaFmFaculty,
        OfficeName::BsoaFaculty,
        OfficeName::CampusDirector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfficeName::Registrar => "Registrar Office",
            OfficeName::Cashier => "Cashier",
            OfficeName::AdmissionGuidance => "Admission & Guidance",
            OfficeName::StudentAffairs => "Student Affairs and Services",
            OfficeName::BsitFaculty => "BSIT Faculty",
            OfficeName::BeedFaculty => "BEED Faculty",
            OfficeName::BsbaOmFaculty => "BSBA OM Faculty",
            OfficeName::BsbaFmFaculty => "BSBA FM Faculty",
            OfficeName::BsoaFaculty => "BSOA Faculty",
            OfficeName::CampusDirector => "Campus Director",
        }
    }

    /// Prefix of the user-visible appointment code.
    pub fn code(&self) -> &'static str {
        match self {
            OfficeName::Registrar => "REG",
            OfficeName::Cashier => "CSH",
            OfficeName::AdmissionGuidance => "ADG",
            OfficeName::StudentAffairs => "SAS",
            OfficeName::BsitFaculty => "BSIT",
            OfficeName::BeedFaculty => "BEED",
            OfficeName::BsbaOmFaculty => "BSBAOM",
            OfficeName::BsbaFmFaculty => "BSBAFM",
            OfficeName::BsoaFaculty => "BSOA",
            OfficeName::CampusDirector => "CD",
        }
    }

    /// Campus Director exists for accounts only and cannot receive appointments.
    pub fn is_bookable(&self) -> bool {
        !matches!(self, OfficeName::CampusDirector)
    }
}

impl fmt::Display for OfficeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OfficeName {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OfficeName::ALL
            .into_iter()
            .find(|office| office.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DirectoryError::UnknownOffice(s.to_string()))
    }
}

/// Per-office configuration maintained by administrators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfficeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: OfficeName,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub personnel_name: String,
}

impl OfficeSettings {
    pub fn unconfigured(name: OfficeName) -> Self {
        Self {
            id: None,
            name,
            phone_number: String::new(),
            personnel_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOfficeRequest {
    pub phone_number: String,
    pub personnel_name: String,
}

// ==============================================================================
// SERVICES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub office: OfficeName,
    #[serde(default)]
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub office: OfficeName,
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceQuery {
    pub office: Option<OfficeName>,
}

// ==============================================================================
// HOLIDAYS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holiday {
    pub id: String,
    pub date: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHolidayRequest {
    pub date: NaiveDate,
    pub label: String,
}

// ==============================================================================
// ACCOUNTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub office: Option<OfficeName>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Unknown office: {0}")]
    UnknownOffice(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Role change from {from} to {to} is not allowed")]
    InvalidRoleTransition { from: Role, to: Role },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_names_round_trip_through_display() {
        for office in OfficeName::ALL {
            assert_eq!(office.to_string().parse::<OfficeName>().unwrap(), office);
        }
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&OfficeName::AdmissionGuidance).unwrap();
        assert_eq!(json, "\"Admission & Guidance\"");
    }

    #[test]
    fn campus_director_is_not_bookable() {
        let bookable: Vec<_> = OfficeName::ALL.into_iter().filter(|o| o.is_bookable()).collect();
        assert_eq!(bookable.len(), 9);
        assert!(!OfficeName::CampusDirector.is_bookable());
    }
}
