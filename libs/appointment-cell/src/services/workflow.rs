// libs/appointment-cell/src/services/workflow.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, info, warn};

use directory_cell::{HolidayService, OfficeName, OfficeService};
use feedback_cell::FeedbackService;
use notification_cell::services::templates::{approval_message, decline_message};
use notification_cell::NotificationSender;
use shared_config::AppConfig;
use shared_database::{DocumentStore, Filter};
use shared_models::auth::User;
use shared_models::{Capability, Role};

use crate::models::{
    Appointment, AppointmentCandidate, AppointmentError, AppointmentStatus, AuditLogEntry,
    BulkDeclineReport, OfficeSuspensionRequest, Slot, SubmitAppointmentRequest, TimeRange, ValidatedSubmission,
    WorkflowOutcome, WorkflowWarning,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::repository::{approval_guards, status_patch, AppointmentRepository};
use crate::services::slip::AppointmentSlip;
use crate::services::validation::SubmissionValidator;

/// Owns the appointment lifecycle: submission checks, staff review, completion
/// and office suspensions. Every mutation re-reads the appointment and commits
/// through a compare-and-set on its status.
pub struct AppointmentWorkflowService {
    repository: AppointmentRepository,
    conflicts: ConflictDetectionService,
    lifecycle: AppointmentLifecycleService,
    holidays: HolidayService,
    offices: OfficeService,
    feedback: FeedbackService,
    notifier: Arc<dyn NotificationSender>,
    config: Arc<AppConfig>,
    fixed_today: Option<NaiveDate>,
}

impl AppointmentWorkflowService {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        let repository = AppointmentRepository::new(store.clone());
        Self {
            conflicts: ConflictDetectionService::new(repository.clone()),
            repository,
            lifecycle: AppointmentLifecycleService::new(),
            holidays: HolidayService::new(store.clone()),
            offices: OfficeService::new(store.clone()),
            feedback: FeedbackService::new(store),
            notifier,
            config,
            fixed_today: None,
        }
    }

    /// Pin the campus calendar date used for lead-time checks and feedback dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| self.config.campus_today())
    }

    // ==========================================================================
    // SLOT QUERIES
    // ==========================================================================

    pub async fn count_approved(
        &self,
        office: OfficeName,
        date: NaiveDate,
        time_range: TimeRange,
    ) -> Result<usize, AppointmentError> {
        let slot = Slot { office, date, time_range };
        Ok(self.conflicts.count_approved(&slot).await?)
    }

    pub async fn has_conflicting_approved(
        &self,
        requester_id: &str,
        date: NaiveDate,
        time_range: TimeRange,
    ) -> Result<bool, AppointmentError> {
        Ok(self
            .conflicts
            .has_conflicting_approved(requester_id, date, time_range, None)
            .await?)
    }

    // ==========================================================================
    // SUBMISSION
    // ==========================================================================

    /// Runs the submission checks in order and returns the first rejection.
    pub async fn validate_submission(
        &self,
        candidate: &AppointmentCandidate,
    ) -> Result<ValidatedSubmission, AppointmentError> {
        let validated = SubmissionValidator::check_required_fields(candidate)?;
        let slot = validated.slot;

        SubmissionValidator::check_lead_time(slot.date, self.today())?;
        SubmissionValidator::check_weekday(slot.date)?;

        if let Some(holiday) = self.holidays.find_on(slot.date).await? {
            debug!("{} is a holiday: {}", slot.date, holiday.label);
            return Err(AppointmentError::HolidayBlocked(holiday.label));
        }

        if !self.conflicts.has_capacity(&slot).await? {
            return Err(AppointmentError::SlotFull);
        }

        if self
            .conflicts
            .has_conflicting_approved(&validated.requester_id, slot.date, slot.time_range, None)
            .await?
        {
            return Err(AppointmentError::DuplicateBooking);
        }

        Ok(validated)
    }

    pub async fn submit(
        &self,
        actor: &User,
        request: SubmitAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if !actor.can(Capability::SubmitAppointment) {
            return Err(AppointmentError::Unauthorized(format!(
                "{} accounts cannot request appointments",
                actor.role
            )));
        }

        let candidate = candidate_for(actor, request);
        let validated = self.validate_submission(&candidate).await?;
        let status = self.lifecycle.initial_status(validated.requester_role);

        let mut appointment = Appointment {
            id: String::new(),
            requester_id: validated.requester_id,
            kind: validated.kind,
            selected_date: validated.slot.date,
            time_range: validated.slot.time_range,
            office: validated.slot.office,
            service: validated.service,
            personnel: validated.personnel,
            reason: validated.reason,
            requester_name: validated.requester_name,
            requester_contact: validated.requester_contact,
            requester_email: validated.requester_email,
            requester_role: validated.requester_role,
            created_at: Utc::now(),
            status,
            decline_reason: None,
            cancelled_at: None,
        };

        // Approved-on-create occupies the slot, so it goes through the capacity guards.
        let guards = match status {
            AppointmentStatus::Approved => approval_guards(&appointment).to_vec(),
            _ => Vec::new(),
        };
        appointment.id = self.repository.insert(&appointment, &guards).await?;

        info!(
            "Appointment {} submitted by {} for {} {} {} ({})",
            appointment.display_code(),
            appointment.requester_id,
            appointment.office,
            appointment.selected_date,
            appointment.time_range,
            appointment.status
        );
        Ok(appointment)
    }

    // ==========================================================================
    // STAFF REVIEW
    // ==========================================================================

    pub async fn approve(&self, actor: &User, appointment_id: &str) -> Result<WorkflowOutcome, AppointmentError> {
        let mut appointment = self.load_for_review(actor, appointment_id).await?;
        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Approved)?;

        if !self.conflicts.has_capacity(&appointment.slot()).await? {
            return Err(AppointmentError::SlotFull);
        }

        if self
            .conflicts
            .has_conflicting_approved(
                &appointment.requester_id,
                appointment.selected_date,
                appointment.time_range,
                Some(&appointment.id),
            )
            .await?
        {
            return Err(AppointmentError::DuplicateBooking);
        }

        // Both rules are re-checked inside the write; concurrent approvals may have raced the reads above.
        self.repository
            .transition(
                &appointment.id,
                appointment.status,
                status_patch(AppointmentStatus::Approved, json!({})),
                &approval_guards(&appointment),
            )
            .await
            .map_err(|e| {
                warn!("Approval of {} rejected by store: {}", appointment.id, e);
                AppointmentError::from(e)
            })?;

        appointment.status = AppointmentStatus::Approved;
        info!("Appointment {} approved by {}", appointment.display_code(), actor.id);

        let mut warnings = Vec::new();
        if let Some(warning) = self.notify(&appointment, approval_message(&appointment.notice())).await {
            warnings.push(warning);
        }

        Ok(WorkflowOutcome { appointment, warnings })
    }

    pub async fn decline(
        &self,
        actor: &User,
        appointment_id: &str,
        reason: &str,
    ) -> Result<WorkflowOutcome, AppointmentError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppointmentError::ValidationError(
                "A decline reason is required".to_string(),
            ));
        }

        let mut appointment = self.load_for_review(actor, appointment_id).await?;
        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Declined)?;

        self.repository
            .transition(
                &appointment.id,
                appointment.status,
                status_patch(AppointmentStatus::Declined, json!({ "decline_reason": reason })),
                &[],
            )
            .await?;

        appointment.status = AppointmentStatus::Declined;
        appointment.decline_reason = Some(reason.to_string());
        info!("Appointment {} declined by {}", appointment.display_code(), actor.id);

        let mut warnings = Vec::new();
        if let Some(warning) = self
            .notify(&appointment, decline_message(&appointment.notice(), reason))
            .await
        {
            warnings.push(warning);
        }

        Ok(WorkflowOutcome { appointment, warnings })
    }

    /// Closes an approved appointment, then opens a feedback survey and writes an
    /// audit log entry. Failures after the status change are returned as warnings.
    pub async fn complete(&self, actor: &User, appointment_id: &str) -> Result<WorkflowOutcome, AppointmentError> {
        let mut appointment = self.load_for_review(actor, appointment_id).await?;
        self.lifecycle
            .validate_status_transition(appointment.status, AppointmentStatus::Completed)?;

        self.repository
            .transition(
                &appointment.id,
                appointment.status,
                status_patch(AppointmentStatus::Completed, json!({})),
                &[],
            )
            .await?;

        appointment.status = AppointmentStatus::Completed;
        info!("Appointment {} completed", appointment.display_code());

        let mut warnings = Vec::new();

        if let Err(e) = self
            .feedback
            .create_pending(&appointment.requester_id, appointment.office, self.today())
            .await
        {
            warn!("Feedback survey for {} not created: {}", appointment.id, e);
            warnings.push(WorkflowWarning::FeedbackCreationFailed(e.to_string()));
        }

        let entry = AuditLogEntry {
            appointment_id: appointment.id.clone(),
            office: appointment.office,
            requester_name: appointment.requester_name.clone(),
            appointment_date: appointment.selected_date,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.repository.log_completion(&entry).await {
            warn!("Audit log for {} not written: {}", appointment.id, e);
            warnings.push(WorkflowWarning::AuditLogFailed(e.to_string()));
        }

        Ok(WorkflowOutcome { appointment, warnings })
    }

    /// Declines every approved appointment of an office dated within
    /// `[start_date, end_date]`. Each record is updated independently and no
    /// SMS is sent.
    pub async fn bulk_decline_by_date_range(
        &self,
        actor: &User,
        request: &OfficeSuspensionRequest,
    ) -> Result<BulkDeclineReport, AppointmentError> {
        if !actor.can(Capability::SuspendOffice) || !actor.covers_office(request.office.as_str()) {
            return Err(AppointmentError::Unauthorized(format!(
                "Not allowed to suspend {}",
                request.office
            )));
        }

        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(AppointmentError::ValidationError(
                "A suspension reason is required".to_string(),
            ));
        }
        if request.start_date > request.end_date {
            return Err(AppointmentError::ValidationError(
                "Suspension start date is after its end date".to_string(),
            ));
        }

        let affected = self
            .repository
            .find_in_range(
                Some(request.office),
                request.start_date,
                request.end_date,
                Some(AppointmentStatus::Approved),
            )
            .await?;

        let cancelled_at = Utc::now();
        let results = join_all(affected.iter().map(|appointment| {
            self.repository.transition(
                &appointment.id,
                AppointmentStatus::Approved,
                status_patch(
                    AppointmentStatus::Declined,
                    json!({ "decline_reason": reason, "cancelled_at": cancelled_at }),
                ),
                &[],
            )
        }))
        .await;

        let mut report = BulkDeclineReport {
            matched: affected.len(),
            ..Default::default()
        };
        for (appointment, result) in affected.iter().zip(results) {
            match result {
                Ok(()) => report.declined += 1,
                Err(e) => {
                    warn!("Suspension could not decline {}: {}", appointment.id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "{} suspended {} to {}: {} declined, {} failed",
            request.office, request.start_date, request.end_date, report.declined, report.failed
        );
        Ok(report)
    }

    // ==========================================================================
    // READ SURFACE
    // ==========================================================================

    /// Visible to the requester who owns it and to reviewers of its office.
    pub async fn get(&self, actor: &User, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if appointment.requester_id != actor.id && !can_view_office(actor, appointment.office) {
            return Err(AppointmentError::Unauthorized(
                "Not allowed to view this appointment".to_string(),
            ));
        }
        Ok(appointment)
    }

    pub async fn slip(&self, actor: &User, appointment_id: &str) -> Result<AppointmentSlip, AppointmentError> {
        let appointment = self.get(actor, appointment_id).await?;
        if appointment.status != AppointmentStatus::Approved {
            return Err(AppointmentError::ValidationError(format!(
                "Slips are only issued for approved appointments, this one is {}",
                appointment.status
            )));
        }

        let office = self
            .offices
            .get_office(appointment.office)
            .await
            .map_err(|e| AppointmentError::StoreUnavailable(e.to_string()))?;
        Ok(AppointmentSlip::new(&appointment, &office))
    }

    pub async fn list_mine(&self, actor: &User) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = self
            .repository
            .find(&[Filter::eq("requester_id", &actor.id)])
            .await?;
        appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(appointments)
    }

    pub async fn list_for_office(
        &self,
        actor: &User,
        office: OfficeName,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if !can_view_office(actor, office) {
            return Err(AppointmentError::Unauthorized(format!(
                "Not allowed to view appointments for {}",
                office
            )));
        }

        let mut filters = vec![Filter::eq("office", office)];
        if let Some(status) = status {
            filters.push(Filter::eq("status", status));
        }
        let mut appointments = self.repository.find(&filters).await?;
        sort_by_schedule(&mut appointments);
        Ok(appointments)
    }

    /// Appointments dated within `[start, end]`. Staff without an explicit office
    /// see their own office only.
    pub async fn calendar(
        &self,
        actor: &User,
        start: NaiveDate,
        end: NaiveDate,
        office: Option<OfficeName>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if start > end {
            return Err(AppointmentError::ValidationError(
                "Calendar start date is after its end date".to_string(),
            ));
        }
        if !actor.can(Capability::ViewAllAppointments) {
            return Err(AppointmentError::Unauthorized(
                "Not allowed to view the appointment calendar".to_string(),
            ));
        }

        let office = match office {
            Some(office) if !actor.covers_office(office.as_str()) => {
                return Err(AppointmentError::Unauthorized(format!(
                    "Not allowed to view appointments for {}",
                    office
                )));
            }
            Some(office) => Some(office),
            None if matches!(actor.role, Role::Admin | Role::Director) => None,
            None => Some(staff_office(actor)?),
        };

        let mut appointments = self.repository.find_in_range(office, start, end, None).await?;
        sort_by_schedule(&mut appointments);
        Ok(appointments)
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    async fn load(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.repository
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    async fn load_for_review(&self, actor: &User, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !actor.can(Capability::ReviewAppointments) || !actor.covers_office(appointment.office.as_str()) {
            return Err(AppointmentError::Unauthorized(format!(
                "Not allowed to review appointments for {}",
                appointment.office
            )));
        }
        Ok(appointment)
    }

    async fn notify(&self, appointment: &Appointment, body: String) -> Option<WorkflowWarning> {
        if appointment.requester_contact.trim().is_empty() {
            warn!("Appointment {} has no contact number, skipping notification", appointment.id);
            return Some(WorkflowWarning::NotificationSendFailed(
                "No contact number on file".to_string(),
            ));
        }

        let outcome = self.notifier.send(&appointment.requester_contact, &body).await;
        if outcome.success {
            debug!("Notified {} about {}", appointment.requester_contact, appointment.id);
            return None;
        }

        let error = outcome.error.unwrap_or_else(|| "unknown gateway error".to_string());
        warn!("Notification for {} failed: {}", appointment.id, error);
        Some(WorkflowWarning::NotificationSendFailed(error))
    }
}

/// Binds a request to the submitting account. Profile values fill in blank
/// contact details.
fn candidate_for(actor: &User, request: SubmitAppointmentRequest) -> AppointmentCandidate {
    let contact = actor
        .metadata
        .as_ref()
        .and_then(|meta| meta.get("contact_number"))
        .and_then(|value| value.as_str())
        .map(str::to_string);

    AppointmentCandidate {
        requester_id: actor.id.clone(),
        requester_role: actor.role,
        requester_name: actor.display_name(),
        requester_contact: contact.unwrap_or_default(),
        requester_email: actor.email.clone().unwrap_or_default(),
        request,
    }
}

fn can_view_office(actor: &User, office: OfficeName) -> bool {
    actor.can(Capability::ViewAllAppointments) && actor.covers_office(office.as_str())
}

fn staff_office(actor: &User) -> Result<OfficeName, AppointmentError> {
    actor
        .office
        .as_deref()
        .and_then(|office| office.parse().ok())
        .ok_or_else(|| AppointmentError::Unauthorized("Staff account has no assigned office".to_string()))
}

fn sort_by_schedule(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        (a.selected_date, a.time_range, a.created_at).cmp(&(b.selected_date, b.time_range, b.created_at))
    });
}
