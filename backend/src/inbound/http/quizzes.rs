//! Quiz API handlers.
//!
//! Student-facing listings withhold the correct-answer indices; authoring
//! responses and staff attempt listings carry full records.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{CreateQuizCommand, QuizDesk, SubmitAttemptCommand};
use crate::domain::{CourseId, Error, Question, Quiz, QuizAttempt};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_caller;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// One question as authored.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBody {
    /// The question text.
    pub prompt: String,
    /// Candidate answers, at least two.
    pub choices: Vec<String>,
    /// Zero-based index of the correct choice.
    pub correct_choice: u32,
    /// Points awarded for a correct answer.
    pub points: u32,
}

/// Body accepted when creating a quiz.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizBody {
    /// Quiz heading.
    pub title: String,
    /// Question set.
    pub questions: Vec<QuestionBody>,
}

/// One question with the answer key withheld.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// The question text.
    pub prompt: String,
    /// Candidate answers.
    pub choices: Vec<String>,
    /// Points on offer.
    pub points: u32,
}

/// Student-facing quiz view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    /// Quiz identifier.
    pub id: Uuid,
    /// Owning course.
    pub course_id: String,
    /// Quiz heading.
    pub title: String,
    /// Questions without correct-answer indices.
    pub questions: Vec<QuestionView>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Quiz> for QuizView {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            course_id: quiz.course_id.to_string(),
            title: quiz.title,
            questions: quiz
                .questions
                .into_iter()
                .map(|question| QuestionView {
                    prompt: question.prompt,
                    choices: question.choices,
                    points: question.points,
                })
                .collect(),
            created_at: quiz.created_at,
        }
    }
}

/// Envelope for student-facing quiz listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuizListResponse {
    /// Quizzes attached to the course, newest first.
    pub quizzes: Vec<QuizView>,
}

/// Body accepted when submitting an attempt.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AttemptBody {
    /// Chosen answer indices, aligned with the question order.
    pub answers: Vec<u32>,
}

/// Envelope for staff attempt listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttemptListResponse {
    /// Attempts against the quiz, newest first.
    pub attempts: Vec<QuizAttempt>,
}

fn parse_course_id(raw: &str) -> Result<CourseId, Error> {
    CourseId::new(raw).map_err(|_| {
        Error::invalid_request("course id must be a valid UUID")
            .with_details(json!({ "field": "courseId" }))
    })
}

fn parse_quiz_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| {
        Error::invalid_request("quiz id must be a valid UUID")
            .with_details(json!({ "field": "quizId" }))
    })
}

/// Author a quiz under an owned course.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/quizzes",
    params(("id" = String, Path, description = "Course identifier")),
    request_body = CreateQuizBody,
    responses(
        (status = 201, description = "Quiz created, including the answer key"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["quizzes"],
    operation_id = "createQuiz"
)]
#[post("/courses/{id}/quizzes")]
pub async fn create_quiz(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateQuizBody>,
) -> ApiResult<HttpResponse> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    let payload = payload.into_inner();
    let quiz = state
        .quizzes
        .create(CreateQuizCommand {
            course_id,
            title: payload.title,
            questions: payload
                .questions
                .into_iter()
                .map(|question| Question {
                    prompt: question.prompt,
                    choices: question.choices,
                    correct_choice: question.correct_choice,
                    points: question.points,
                })
                .collect(),
            caller,
        })
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

/// List a course's quizzes with answer keys withheld.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/quizzes",
    params(("id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Quizzes for the course", body = QuizListResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["quizzes"],
    operation_id = "courseQuizzes"
)]
#[get("/courses/{id}/quizzes")]
pub async fn course_quizzes(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<QuizListResponse>> {
    require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    let quizzes = state
        .quizzes
        .list_for_course(&course_id)
        .await?
        .into_iter()
        .map(QuizView::from)
        .collect();
    Ok(web::Json(QuizListResponse { quizzes }))
}

/// Submit and grade an attempt.
#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{id}/attempts",
    params(("id" = String, Path, description = "Quiz identifier")),
    request_body = AttemptBody,
    responses(
        (status = 201, description = "Graded attempt", body = QuizAttempt),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "An accepted enrollment is required", body = Error),
        (status = 404, description = "Quiz not found", body = Error)
    ),
    tags = ["quizzes"],
    operation_id = "submitAttempt"
)]
#[post("/quizzes/{id}/attempts")]
pub async fn submit_attempt(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AttemptBody>,
) -> ApiResult<HttpResponse> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let quiz_id = parse_quiz_id(&path.into_inner())?;
    let attempt = state
        .quizzes
        .submit_attempt(SubmitAttemptCommand {
            quiz_id,
            answers: payload.into_inner().answers,
            caller,
        })
        .await?;
    Ok(HttpResponse::Created().json(attempt))
}

/// List every attempt against a quiz (course staff only).
#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}/attempts",
    params(("id" = String, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Attempts for the quiz", body = AttemptListResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Quiz not found", body = Error)
    ),
    tags = ["quizzes"],
    operation_id = "quizAttempts"
)]
#[get("/quizzes/{id}/attempts")]
pub async fn quiz_attempts(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<AttemptListResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let quiz_id = parse_quiz_id(&path.into_inner())?;
    let attempts = state.quizzes.list_attempts(&quiz_id, &caller).await?;
    Ok(web::Json(AttemptListResponse { attempts }))
}
