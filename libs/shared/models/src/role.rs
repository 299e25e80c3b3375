use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role. Every permission decision goes through [`Role::can`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Alumni,
    Client,
    #[serde(alias = "office")]
    Staff,
    Admin,
    Director,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitAppointment,
    ReviewAppointments,
    SuspendOffice,
    ViewAllAppointments,
    ManageDirectory,
    AnswerFeedback,
    ViewFeedbackSummary,
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;
        use Role::*;

        match capability {
            SubmitAppointment | AnswerFeedback => matches!(self, Student | Alumni | Client),
            ReviewAppointments | SuspendOffice => matches!(self, Staff | Admin),
            ViewAllAppointments | ViewFeedbackSummary => matches!(self, Staff | Admin | Director),
            ManageDirectory => matches!(self, Admin),
        }
    }

    /// Client submissions are approved on creation instead of waiting for staff review.
    pub fn is_self_service(&self) -> bool {
        matches!(self, Role::Client)
    }

    /// Only student <-> alumni moves are allowed.
    pub fn can_transition_to(&self, target: Role) -> bool {
        matches!(
            (self, target),
            (Role::Student, Role::Alumni) | (Role::Alumni, Role::Student)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Alumni => "alumni",
            Role::Client => "client",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::Director => "director",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "alumni" => Ok(Role::Alumni),
            "client" => Ok(Role::Client),
            "staff" | "office" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "director" => Ok(Role::Director),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
