// libs/feedback-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use directory_cell::OfficeName;
use shared_database::StoreError;

pub const QUESTION_COUNT: usize = 9;
pub const MAX_SCORE: u8 = 5;

/// Client satisfaction survey, one score per question.
pub const SURVEY_QUESTIONS: [&str; QUESTION_COUNT] = [
    "I was attended to promptly.",
    "The office followed the announced schedule and procedure.",
    "The office was easy to reach and comfortable to wait in.",
    "Instructions and requirements were explained clearly.",
    "Fees charged, if any, were reasonable and properly receipted.",
    "Staff treated me fairly and without favor.",
    "Staff were courteous and knowledgeable.",
    "I got what I needed from the visit.",
    "Overall, I am satisfied with the service.",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub id: String,
    pub requester_id: String,
    pub office: OfficeName,
    pub created_at: NaiveDate,
    pub completed: bool,
    pub answers: [u8; QUESTION_COUNT],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionAverage {
    pub question: String,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackSummary {
    pub office: OfficeName,
    pub responses: usize,
    pub averages: Vec<QuestionAverage>,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback not found")]
    NotFound,

    #[error("Feedback has already been answered")]
    AlreadyAnswered,

    #[error("Invalid answers: {0}")]
    InvalidAnswers(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
