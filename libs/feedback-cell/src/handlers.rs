// libs/feedback-cell/src/handlers.rs
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use directory_cell::OfficeName;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::Capability;

use crate::models::{FeedbackError, SubmitAnswersRequest, SURVEY_QUESTIONS};
use crate::router::FeedbackState;
use crate::services::feedback::FeedbackService;

impl From<FeedbackError> for AppError {
    fn from(e: FeedbackError) -> Self {
        match e {
            FeedbackError::NotFound => AppError::NotFound(e.to_string()),
            FeedbackError::AlreadyAnswered => AppError::Conflict(e.to_string()),
            FeedbackError::InvalidAnswers(_) => AppError::ValidationError(e.to_string()),
            FeedbackError::Unauthorized(msg) => AppError::Forbidden(msg),
            FeedbackError::Store(store) => AppError::Database(store.to_string()),
        }
    }
}

pub async fn list_pending_feedback(
    State(state): State<FeedbackState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let pending = FeedbackService::new(state.store.clone())
        .list_pending(&user.id)
        .await?;

    Ok(Json(json!({
        "questions": SURVEY_QUESTIONS,
        "pending": pending,
    })))
}

pub async fn submit_feedback_answers(
    State(state): State<FeedbackState>,
    Extension(user): Extension<User>,
    Path(feedback_id): Path<String>,
    Json(request): Json<SubmitAnswersRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.can(Capability::AnswerFeedback) {
        return Err(AppError::Forbidden("Only requesters answer feedback surveys".to_string()));
    }

    let feedback = FeedbackService::new(state.store.clone())
        .submit_answers(&user, &feedback_id, &request.answers)
        .await?;

    Ok(Json(json!({
        "success": true,
        "feedback": feedback,
        "message": "Thank you for your feedback"
    })))
}

pub async fn get_feedback_summary(
    State(state): State<FeedbackState>,
    Extension(user): Extension<User>,
    Path(office): Path<String>,
) -> Result<Json<Value>, AppError> {
    let office: OfficeName = office.parse()?;
    if !user.can(Capability::ViewFeedbackSummary) || !user.covers_office(office.as_str()) {
        return Err(AppError::Forbidden("Not authorized to view this office's feedback".to_string()));
    }

    let summary = FeedbackService::new(state.store.clone()).summary(office).await?;
    Ok(Json(json!(summary)))
}
