//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{chat_messages, courses, enrollments, payments, quiz_attempts, quizzes, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub enrolled_course_ids: Vec<Uuid>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
    pub enrolled_course_ids: &'a [Uuid],
}

// ---------------------------------------------------------------------------
// Course models
// ---------------------------------------------------------------------------

/// Row struct for reading from the courses table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CourseRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub instructor_id: Uuid,
    pub price_cents: i64,
    pub lessons: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new course records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = courses)]
pub(crate) struct NewCourseRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub instructor_id: Uuid,
    pub price_cents: i64,
    pub lessons: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Changeset struct for updating existing course records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = courses)]
pub(crate) struct CourseUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub price_cents: i64,
    pub lessons: &'a serde_json::Value,
}

// ---------------------------------------------------------------------------
// Enrollment models
// ---------------------------------------------------------------------------

/// Row struct for reading from the enrollments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EnrollmentRow {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new enrollment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = enrollments)]
pub(crate) struct NewEnrollmentRow<'a> {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Quiz models
// ---------------------------------------------------------------------------

/// Row struct for reading from the quizzes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quizzes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct QuizRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub questions: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new quiz records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quizzes)]
pub(crate) struct NewQuizRow<'a> {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: &'a str,
    pub questions: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the quiz_attempts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = quiz_attempts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct QuizAttemptRow {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub student_id: Uuid,
    pub answers: serde_json::Value,
    pub score: i32,
    pub max_score: i32,
    pub submitted_at: DateTime<Utc>,
}

/// Insertable struct for creating new attempt records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = quiz_attempts)]
pub(crate) struct NewQuizAttemptRow<'a> {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub student_id: Uuid,
    pub answers: &'a serde_json::Value,
    pub score: i32,
    pub max_score: i32,
    pub submitted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat models
// ---------------------------------------------------------------------------

/// Row struct for reading from the chat_messages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChatMessageRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Insertable struct for creating new chat message records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_messages)]
pub(crate) struct NewChatMessageRow<'a> {
    pub id: Uuid,
    pub course_id: Uuid,
    pub sender_id: Uuid,
    pub body: &'a str,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Payment models
// ---------------------------------------------------------------------------

/// Row struct for reading from the payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub amount_cents: i64,
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
}

/// Insertable struct for creating new payment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub amount_cents: i64,
    pub reference: &'a str,
    pub recorded_at: DateTime<Utc>,
}
