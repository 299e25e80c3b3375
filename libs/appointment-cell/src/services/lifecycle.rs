// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::Role;

use crate::models::{AppointmentError, AppointmentStatus};

/// Status state machine. `declined` and `completed` are terminal.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Status assigned at submission. External clients are approved immediately.
    pub fn initial_status(&self, role: Role) -> AppointmentStatus {
        if role.is_self_service() {
            AppointmentStatus::Approved
        } else {
            AppointmentStatus::Pending
        }
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                action: action_name(new_status),
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Approved, AppointmentStatus::Declined],
            AppointmentStatus::Approved => vec![AppointmentStatus::Declined, AppointmentStatus::Completed],
            AppointmentStatus::Declined | AppointmentStatus::Completed => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

fn action_name(target: AppointmentStatus) -> &'static str {
    match target {
        AppointmentStatus::Pending => "reopen",
        AppointmentStatus::Approved => "approve",
        AppointmentStatus::Declined => "decline",
        AppointmentStatus::Completed => "complete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn terminal_states_have_no_exits() {
        let lifecycle = AppointmentLifecycleService::new();
        for status in [AppointmentStatus::Declined, AppointmentStatus::Completed] {
            assert!(status.is_terminal());
            assert!(lifecycle.get_valid_transitions(status).is_empty());
        }
    }

    #[test]
    fn pending_cannot_be_completed() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Completed),
            Err(AppointmentError::InvalidStatusTransition { from: AppointmentStatus::Pending, action: "complete" })
        );
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Approved, AppointmentStatus::Completed)
            .is_ok());
    }

    #[test]
    fn clients_start_approved() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_eq!(lifecycle.initial_status(Role::Client), AppointmentStatus::Approved);
        assert_eq!(lifecycle.initial_status(Role::Student), AppointmentStatus::Pending);
        assert_eq!(lifecycle.initial_status(Role::Alumni), AppointmentStatus::Pending);
    }
}
