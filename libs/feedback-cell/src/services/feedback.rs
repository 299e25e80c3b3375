// libs/feedback-cell/src/services/feedback.rs
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info, warn};

use directory_cell::OfficeName;
use shared_database::store::{from_document, to_document};
use shared_database::{Document, DocumentStore, Filter, StoreError};
use shared_models::auth::User;

use crate::models::{
    Feedback, FeedbackError, FeedbackSummary, QuestionAverage, MAX_SCORE, QUESTION_COUNT,
    SURVEY_QUESTIONS,
};

const FEEDBACKS: &str = "feedbacks";

pub struct FeedbackService {
    store: Arc<dyn DocumentStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Open an unanswered survey for a requester after an office visit.
    pub async fn create_pending(
        &self,
        requester_id: &str,
        office: OfficeName,
        created_at: NaiveDate,
    ) -> Result<Feedback, FeedbackError> {
        let mut feedback = Feedback {
            id: String::new(),
            requester_id: requester_id.to_string(),
            office,
            created_at,
            completed: false,
            answers: [0; QUESTION_COUNT],
        };

        feedback.id = self.store.create(FEEDBACKS, to_document(&feedback)?).await?;
        info!("Opened feedback {} for {} at {}", feedback.id, requester_id, office);
        Ok(feedback)
    }

    pub async fn list_pending(&self, requester_id: &str) -> Result<Vec<Feedback>, FeedbackError> {
        let filters = [
            Filter::eq("requester_id", requester_id),
            Filter::eq("completed", false),
        ];
        let mut pending: Vec<Feedback> = self
            .store
            .find(FEEDBACKS, &filters)
            .await?
            .into_iter()
            .map(from_document)
            .collect::<Result<_, _>>()?;
        pending.sort_by_key(|f| f.created_at);
        Ok(pending)
    }

    /// Record the requester's answers. Each survey can be answered once.
    pub async fn submit_answers(
        &self,
        user: &User,
        feedback_id: &str,
        answers: &[u8],
    ) -> Result<Feedback, FeedbackError> {
        let answers = validate_answers(answers)?;

        let mut feedback: Feedback = self
            .store
            .get(FEEDBACKS, feedback_id)
            .await?
            .map(from_document)
            .transpose()?
            .ok_or(FeedbackError::NotFound)?;

        if feedback.requester_id != user.id {
            return Err(FeedbackError::Unauthorized(
                "Only the requester can answer this survey".to_string(),
            ));
        }
        if feedback.completed {
            return Err(FeedbackError::AlreadyAnswered);
        }

        let mut partial = Document::new();
        partial.insert("answers".to_string(), json!(answers));
        partial.insert("completed".to_string(), json!(true));

        self.store
            .update_guarded(FEEDBACKS, feedback_id, &[Filter::eq("completed", false)], partial, &[])
            .await
            .map_err(|e| match e {
                StoreError::PreconditionFailed { .. } => FeedbackError::AlreadyAnswered,
                StoreError::NotFound { .. } => FeedbackError::NotFound,
                other => other.into(),
            })?;

        debug!("Feedback {} answered", feedback_id);
        feedback.answers = answers;
        feedback.completed = true;
        Ok(feedback)
    }

    /// Average score per question across answered surveys for an office.
    pub async fn summary(&self, office: OfficeName) -> Result<FeedbackSummary, FeedbackError> {
        let answered: Vec<Feedback> = self
            .store
            .find(FEEDBACKS, &[Filter::eq("office", office), Filter::eq("completed", true)])
            .await?
            .into_iter()
            .map(from_document)
            .collect::<Result<_, _>>()?;

        let responses = answered.len();
        if responses == 0 {
            warn!("No answered feedback yet for {}", office);
        }

        let averages = SURVEY_QUESTIONS
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let total: u32 = answered.iter().map(|f| f.answers[index] as u32).sum();
                let average = if responses == 0 {
                    0.0
                } else {
                    total as f64 / responses as f64
                };
                QuestionAverage {
                    question: question.to_string(),
                    average,
                }
            })
            .collect();

        Ok(FeedbackSummary {
            office,
            responses,
            averages,
        })
    }
}

fn validate_answers(answers: &[u8]) -> Result<[u8; QUESTION_COUNT], FeedbackError> {
    let answers: [u8; QUESTION_COUNT] = answers.try_into().map_err(|_| {
        FeedbackError::InvalidAnswers(format!(
            "expected {} answers, got {}",
            QUESTION_COUNT,
            answers.len()
        ))
    })?;

    if let Some(position) = answers.iter().position(|score| *score > MAX_SCORE) {
        return Err(FeedbackError::InvalidAnswers(format!(
            "answer {} must be between 0 and {}",
            position + 1,
            MAX_SCORE
        )));
    }

    Ok(answers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_must_cover_every_question() {
        assert!(validate_answers(&[5; 8]).is_err());
        assert!(validate_answers(&[5; 10]).is_err());
        assert_eq!(validate_answers(&[3; 9]).unwrap(), [3; 9]);
    }

    #[test]
    fn answers_are_bounded() {
        let mut answers = [4u8; 9];
        answers[6] = 6;
        let err = validate_answers(&answers).unwrap_err();
        assert_eq!(err.to_string(), "Invalid answers: answer 7 must be between 0 and 5");
    }
}
