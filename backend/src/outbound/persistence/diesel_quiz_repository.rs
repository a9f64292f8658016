//! PostgreSQL-backed `QuizRepository` implementation using Diesel ORM.
//!
//! Questions and answers are stored as jsonb documents; scores are plain
//! integer columns so staff listings never re-grade.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{QuizRepository, QuizStoreError};
use crate::domain::{CourseId, Question, Quiz, QuizAttempt, UserId};

use super::models::{NewQuizAttemptRow, NewQuizRow, QuizAttemptRow, QuizRow};
use super::pool::{DbPool, PoolError};
use super::schema::{quiz_attempts, quizzes};

/// Diesel-backed implementation of the `QuizRepository` port.
#[derive(Clone)]
pub struct DieselQuizRepository {
    pool: DbPool,
}

impl DieselQuizRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain quiz store errors.
fn map_pool_error(error: PoolError) -> QuizStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            QuizStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain quiz store errors.
fn map_diesel_error(error: diesel::result::Error) -> QuizStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => QuizStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            QuizStoreError::connection("database connection error")
        }
        _ => QuizStoreError::query("database error"),
    }
}

/// Convert a database row to a domain quiz.
fn row_to_quiz(row: QuizRow) -> Result<Quiz, QuizStoreError> {
    let questions: Vec<Question> = serde_json::from_value(row.questions).map_err(|err| {
        QuizStoreError::query(format!("corrupted questions document in database: {err}"))
    })?;
    Quiz::new(
        row.id,
        CourseId::from_uuid(row.course_id),
        row.title,
        questions,
        row.created_at,
    )
    .map_err(|err| QuizStoreError::query(format!("corrupted quiz in database: {err}")))
}

/// Convert a database row to a domain attempt.
fn row_to_attempt(row: QuizAttemptRow) -> Result<QuizAttempt, QuizStoreError> {
    let answers: Vec<u32> = serde_json::from_value(row.answers).map_err(|err| {
        QuizStoreError::query(format!("corrupted answers document in database: {err}"))
    })?;
    Ok(QuizAttempt {
        id: row.id,
        quiz_id: row.quiz_id,
        student_id: UserId::from_uuid(row.student_id),
        answers,
        score: row.score.unsigned_abs(),
        max_score: row.max_score.unsigned_abs(),
        submitted_at: row.submitted_at,
    })
}

fn cast_score_for_db(score: u32) -> i32 {
    i32::try_from(score).unwrap_or(i32::MAX)
}

#[async_trait]
impl QuizRepository for DieselQuizRepository {
    async fn insert(&self, quiz: &Quiz) -> Result<(), QuizStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let questions = serde_json::to_value(&quiz.questions).map_err(|err| {
            QuizStoreError::query(format!("failed to serialise questions document: {err}"))
        })?;

        let new_row = NewQuizRow {
            id: quiz.id,
            course_id: *quiz.course_id.as_uuid(),
            title: &quiz.title,
            questions: &questions,
            created_at: quiz.created_at,
        };

        diesel::insert_into(quizzes::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Quiz>, QuizStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<QuizRow> = quizzes::table
            .filter(quizzes::id.eq(id))
            .select(QuizRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_quiz).transpose()
    }

    async fn list_for_course(&self, course_id: &CourseId) -> Result<Vec<Quiz>, QuizStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<QuizRow> = quizzes::table
            .filter(quizzes::course_id.eq(course_id.as_uuid()))
            .order(quizzes::created_at.desc())
            .select(QuizRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_quiz).collect()
    }

    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<(), QuizStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let answers = serde_json::to_value(&attempt.answers).map_err(|err| {
            QuizStoreError::query(format!("failed to serialise answers document: {err}"))
        })?;

        let new_row = NewQuizAttemptRow {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: *attempt.student_id.as_uuid(),
            answers: &answers,
            score: cast_score_for_db(attempt.score),
            max_score: cast_score_for_db(attempt.max_score),
            submitted_at: attempt.submitted_at,
        };

        diesel::insert_into(quiz_attempts::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_attempts(&self, quiz_id: &Uuid) -> Result<Vec<QuizAttempt>, QuizStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<QuizAttemptRow> = quiz_attempts::table
            .filter(quiz_attempts::quiz_id.eq(quiz_id))
            .order(quiz_attempts::submitted_at.desc())
            .select(QuizAttemptRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_attempt).collect()
    }
}
