// libs/appointment-cell/src/services/slip.rs
use serde::Serialize;

use directory_cell::OfficeSettings;

use crate::models::{Appointment, AppointmentKind, AppointmentStatus};

/// Printable confirmation handed to the requester for an approved appointment.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSlip {
    pub code: String,
    pub requester_name: String,
    pub office: String,
    pub office_phone: String,
    pub personnel: Option<String>,
    pub purpose: String,
    pub date: String,
    pub time_range: String,
    pub status: AppointmentStatus,
}

impl AppointmentSlip {
    pub fn new(appointment: &Appointment, office: &OfficeSettings) -> Self {
        let purpose = match appointment.kind {
            AppointmentKind::Service => appointment
                .service
                .clone()
                .unwrap_or_else(|| "Service request".to_string()),
            AppointmentKind::Visit if appointment.reason.is_empty() => "Office visit".to_string(),
            AppointmentKind::Visit => appointment.reason.clone(),
        };

        Self {
            code: appointment.display_code(),
            requester_name: appointment.requester_name.clone(),
            office: appointment.office.to_string(),
            office_phone: office.phone_number.clone(),
            personnel: appointment
                .personnel
                .clone()
                .or_else(|| non_empty(&office.personnel_name)),
            purpose,
            date: appointment.selected_date.format("%A, %B %-d, %Y").to_string(),
            time_range: appointment.time_range.to_string(),
            status: appointment.status,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            "APPOINTMENT SLIP".to_string(),
            format!("Code: {}", self.code),
            format!("Name: {}", self.requester_name),
            format!("Office: {}", self.office),
        ];
        if let Some(personnel) = &self.personnel {
            lines.push(format!("Personnel: {}", personnel));
        }
        lines.push(format!("Purpose: {}", self.purpose));
        lines.push(format!("Date: {}", self.date));
        lines.push(format!("Time: {}", self.time_range));
        if !self.office_phone.is_empty() {
            lines.push(format!("Office contact: {}", self.office_phone));
        }
        lines.push("Present this slip at the office on your scheduled date.".to_string());
        lines.join("\n")
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
