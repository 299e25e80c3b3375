use crate::models::AppointmentNotice;

fn describe(notice: &AppointmentNotice) -> String {
    format!(
        "{} at {} on {}, {}",
        notice.code,
        notice.office,
        notice.date.format("%B %-d, %Y"),
        notice.time_range
    )
}

pub fn approval_message(notice: &AppointmentNotice) -> String {
    format!(
        "Good day {}! Your appointment {} has been APPROVED. Please bring your appointment slip.",
        notice.requester_name,
        describe(notice)
    )
}

pub fn decline_message(notice: &AppointmentNotice, reason: &str) -> String {
    format!(
        "Good day {}! Your appointment {} has been DECLINED. Reason: {}",
        notice.requester_name,
        describe(notice),
        reason
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn notice() -> AppointmentNotice {
        AppointmentNotice {
            requester_name: "Ana".to_string(),
            code: "CSHAB3XQ".to_string(),
            office: "Cashier".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            time_range: "1:00pm-2:00pm".to_string(),
        }
    }

    #[test]
    fn approval_mentions_code_and_slot() {
        let message = approval_message(&notice());
        assert!(message.contains("CSHAB3XQ at Cashier on March 12, 2025, 1:00pm-2:00pm"));
        assert!(message.contains("APPROVED"));
    }

    #[test]
    fn decline_carries_reason() {
        let message = decline_message(&notice(), "Office closed");
        assert!(message.ends_with("Reason: Office closed"));
    }
}
