// libs/appointment-cell/src/services/validation.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::{AppointmentCandidate, AppointmentError, Slot, ValidatedSubmission};

/// Stateless submission checks. Store-backed checks (holidays, capacity,
/// duplicates) run in the workflow after these pass.
pub struct SubmissionValidator;

impl SubmissionValidator {
    /// Kind, date, time range and office are required. Requester details fall back
    /// to the account profile and may stay blank.
    pub fn check_required_fields(candidate: &AppointmentCandidate) -> Result<ValidatedSubmission, AppointmentError> {
        let request = &candidate.request;
        let mut missing = Vec::new();

        if request.kind.is_none() {
            missing.push("kind");
        }
        if request.selected_date.is_none() {
            missing.push("selected_date");
        }
        if request.time_range.is_none() {
            missing.push("time_range");
        }
        if request.office.is_none() {
            missing.push("office");
        }

        let (Some(kind), Some(date), Some(time_range), Some(office)) =
            (request.kind, request.selected_date, request.time_range, request.office)
        else {
            return Err(AppointmentError::MissingFields(to_owned(missing)));
        };

        let requester_name = non_blank(&request.requester_name).unwrap_or(&candidate.requester_name);
        let contact = non_blank(&request.contact_number).unwrap_or(&candidate.requester_contact);

        if !office.is_bookable() {
            return Err(AppointmentError::ValidationError(format!(
                "{} does not accept appointments",
                office
            )));
        }

        Ok(ValidatedSubmission {
            requester_id: candidate.requester_id.clone(),
            requester_role: candidate.requester_role,
            requester_name: requester_name.trim().to_string(),
            requester_contact: contact.trim().to_string(),
            requester_email: non_blank(&request.email)
                .unwrap_or(&candidate.requester_email)
                .trim()
                .to_string(),
            kind,
            slot: Slot { office, date, time_range },
            service: non_blank(&request.service).map(|s| s.trim().to_string()),
            personnel: non_blank(&request.personnel).map(|s| s.trim().to_string()),
            reason: request.reason.as_deref().unwrap_or_default().trim().to_string(),
        })
    }

    /// The earliest bookable date is the day after tomorrow.
    pub fn check_lead_time(date: NaiveDate, today: NaiveDate) -> Result<(), AppointmentError> {
        if date <= today + Duration::days(1) {
            return Err(AppointmentError::LeadTimeViolation);
        }
        Ok(())
    }

    pub fn check_weekday(date: NaiveDate) -> Result<(), AppointmentError> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(AppointmentError::WeekendBlocked);
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|s| !s.trim().is_empty())
}

fn to_owned(fields: Vec<&str>) -> Vec<String> {
    fields.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use directory_cell::OfficeName;
    use shared_models::Role;

    use crate::models::{AppointmentKind, SubmitAppointmentRequest, TimeRange};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(request: SubmitAppointmentRequest) -> AppointmentCandidate {
        AppointmentCandidate {
            requester_id: "student-1".to_string(),
            requester_role: Role::Student,
            requester_name: "Ana Cruz".to_string(),
            requester_contact: "09171234567".to_string(),
            requester_email: "ana@campus.edu".to_string(),
            request,
        }
    }

    #[test]
    fn lead_time_requires_a_full_day_gap() {
        let today = date(2024, 6, 10);
        assert_matches!(
            SubmissionValidator::check_lead_time(date(2024, 6, 11), today),
            Err(AppointmentError::LeadTimeViolation)
        );
        assert_matches!(
            SubmissionValidator::check_lead_time(today, today),
            Err(AppointmentError::LeadTimeViolation)
        );
        assert!(SubmissionValidator::check_lead_time(date(2024, 6, 12), today).is_ok());
    }

    #[test]
    fn weekends_are_blocked() {
        assert_matches!(
            SubmissionValidator::check_weekday(date(2024, 6, 15)),
            Err(AppointmentError::WeekendBlocked)
        );
        assert_matches!(
            SubmissionValidator::check_weekday(date(2024, 6, 16)),
            Err(AppointmentError::WeekendBlocked)
        );
        assert!(SubmissionValidator::check_weekday(date(2024, 6, 17)).is_ok());
    }

    #[test]
    fn missing_fields_are_listed() {
        let request = SubmitAppointmentRequest {
            kind: Some(AppointmentKind::Service),
            office: Some(OfficeName::Registrar),
            ..Default::default()
        };
        assert_matches!(
            SubmissionValidator::check_required_fields(&candidate(request)),
            Err(AppointmentError::MissingFields(fields))
                if fields == vec!["selected_date", "time_range"]
        );
    }

    #[test]
    fn four_fields_are_enough() {
        let request = SubmitAppointmentRequest {
            kind: Some(AppointmentKind::Service),
            selected_date: Some(date(2024, 6, 17)),
            time_range: Some(TimeRange::OneToTwo),
            office: Some(OfficeName::Registrar),
            ..Default::default()
        };
        let mut bare = candidate(request);
        bare.requester_name = String::new();
        bare.requester_contact = String::new();

        let validated = SubmissionValidator::check_required_fields(&bare).unwrap();
        assert_eq!(validated.service, None);
        assert_eq!(validated.requester_name, "");
        assert_eq!(validated.requester_contact, "");
    }

    #[test]
    fn profile_fills_requester_details() {
        let request = SubmitAppointmentRequest {
            kind: Some(AppointmentKind::Visit),
            selected_date: Some(date(2024, 6, 17)),
            time_range: Some(TimeRange::NineToTen),
            office: Some(OfficeName::Cashier),
            personnel: Some("  ".to_string()),
            ..Default::default()
        };
        let validated = SubmissionValidator::check_required_fields(&candidate(request)).unwrap();
        assert_eq!(validated.requester_name, "Ana Cruz");
        assert_eq!(validated.requester_contact, "09171234567");
        assert_eq!(validated.personnel, None);
        assert_eq!(validated.slot.office, OfficeName::Cashier);
    }

    #[test]
    fn campus_director_is_not_bookable() {
        let request = SubmitAppointmentRequest {
            kind: Some(AppointmentKind::Visit),
            selected_date: Some(date(2024, 6, 17)),
            time_range: Some(TimeRange::NineToTen),
            office: Some(OfficeName::CampusDirector),
            ..Default::default()
        };
        assert_matches!(
            SubmissionValidator::check_required_fields(&candidate(request)),
            Err(AppointmentError::ValidationError(_))
        );
    }
}
