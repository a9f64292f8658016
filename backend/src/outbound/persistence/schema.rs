//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// User directory table.
    ///
    /// The `enrolled_course_ids` array is the legacy membership list: the
    /// courses the user is considered accepted into. It is owned by the user
    /// row but mutated exclusively through the enrollment workflow.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Human-readable display name (max 32 characters).
        display_name -> Varchar,
        /// Unique contact email.
        email -> Varchar,
        /// Platform role: student, teacher, or admin.
        role -> Varchar,
        /// Legacy membership list of course identifiers.
        enrolled_course_ids -> Array<Uuid>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Course catalog table.
    courses (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Course title (max 200 characters).
        title -> Varchar,
        /// Catalog description.
        description -> Text,
        /// Free-form category tag.
        category -> Varchar,
        /// Owning teacher.
        instructor_id -> Uuid,
        /// Price in integer cents.
        price_cents -> Int8,
        /// Ordered lesson documents.
        lessons -> Jsonb,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Canonical enrollment records.
    ///
    /// The composite primary key is the uniqueness constraint the workflow
    /// relies on: a second insert for the same pair fails instead of
    /// duplicating, even under concurrent writers.
    enrollments (student_id, course_id) {
        /// The enrolling student.
        student_id -> Uuid,
        /// The target course.
        course_id -> Uuid,
        /// Workflow status: pending, accepted, or rejected.
        status -> Varchar,
        /// Creation timestamp, immutable after insert.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Authored quizzes.
    quizzes (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning course.
        course_id -> Uuid,
        /// Quiz heading.
        title -> Varchar,
        /// Question documents.
        questions -> Jsonb,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Graded quiz attempts.
    quiz_attempts (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The attempted quiz.
        quiz_id -> Uuid,
        /// The submitting student.
        student_id -> Uuid,
        /// Chosen answer indices.
        answers -> Jsonb,
        /// Points earned.
        score -> Int4,
        /// Points on offer at submission time.
        max_score -> Int4,
        /// Submission timestamp.
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    /// Persisted course chat messages.
    chat_messages (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Course room.
        course_id -> Uuid,
        /// Message author.
        sender_id -> Uuid,
        /// Message text (max 2000 characters).
        body -> Text,
        /// Server-side receipt timestamp.
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recorded payments.
    payments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Paying student.
        student_id -> Uuid,
        /// Course paid for.
        course_id -> Uuid,
        /// Amount in integer cents.
        amount_cents -> Int8,
        /// Opaque client-supplied reference.
        reference -> Varchar,
        /// Server-side receipt timestamp.
        recorded_at -> Timestamptz,
    }
}
