//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the domain expects to interact with storage
//! adapters; driving ports describe the use-cases inbound adapters invoke.
//! Each driven port exposes strongly typed errors so adapters map their
//! failures into predictable variants instead of returning `anyhow::Result`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use pagination::PageRequest;

use super::chat::{ChatMessage, MessageBody};
use super::course::{Course, CourseId, CourseTitle, Lesson};
use super::enrollment::{EnrollmentId, EnrollmentRecord, EnrollmentStatus, LookupStatus};
use super::error::Error;
use super::payment::PaymentRecord;
use super::policy::Caller;
use super::quiz::{Question, Quiz, QuizAttempt};
use super::user::{EmailAddress, User, UserId};

// ---------------------------------------------------------------------------
// Driven port errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the enrollment record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentStoreError {
    /// Store connectivity failures.
    #[error("enrollment store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("enrollment store query failed: {message}")]
    Query { message: String },
    /// The (student, course) uniqueness constraint rejected an insert.
    #[error("enrollment already exists for student {student_id} and course {course_id}")]
    DuplicatePair {
        student_id: String,
        course_id: String,
    },
}

impl EnrollmentStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for uniqueness violations on the pair key.
    pub fn duplicate_pair(student_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self::DuplicatePair {
            student_id: student_id.into(),
            course_id: course_id.into(),
        }
    }
}

/// Errors surfaced by the legacy membership store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipStoreError {
    /// Store connectivity failures.
    #[error("membership store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("membership store query failed: {message}")]
    Query { message: String },
}

impl MembershipStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by directory lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Directory connectivity failures.
    #[error("directory connection failed: {message}")]
    Connection { message: String },
    /// Lookup failed during execution.
    #[error("directory query failed: {message}")]
    Query { message: String },
}

impl DirectoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the course store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseStoreError {
    /// Store connectivity failures.
    #[error("course store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("course store query failed: {message}")]
    Query { message: String },
}

impl CourseStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the quiz store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizStoreError {
    /// Store connectivity failures.
    #[error("quiz store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("quiz store query failed: {message}")]
    Query { message: String },
}

impl QuizStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the chat message store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatStoreError {
    /// Store connectivity failures.
    #[error("chat store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("chat store query failed: {message}")]
    Query { message: String },
}

impl ChatStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the payment store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentStoreError {
    /// Store connectivity failures.
    #[error("payment store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("payment store query failed: {message}")]
    Query { message: String },
}

impl PaymentStoreError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Driven ports
// ---------------------------------------------------------------------------

/// Persistence port for the canonical enrollment records.
///
/// The store must enforce uniqueness on the (student, course) pair: a second
/// insert for the same pair fails with [`EnrollmentStoreError::DuplicatePair`]
/// rather than producing a duplicate, even under concurrent writers.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Fetch the record for a pair, if any.
    async fn find(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentStoreError>;

    /// Insert a new record; fails with `DuplicatePair` when one exists.
    async fn insert(&self, record: &EnrollmentRecord) -> Result<(), EnrollmentStoreError>;

    /// Update the status of an existing record.
    ///
    /// Returns `false` when no record exists for the pair; `created_at` is
    /// never touched.
    async fn set_status(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
        status: EnrollmentStatus,
    ) -> Result<bool, EnrollmentStoreError>;

    /// Delete the record for a pair; returns whether one existed.
    async fn delete(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, EnrollmentStoreError>;

    /// List records across courses, optionally filtered by status, sorted by
    /// `created_at` descending.
    async fn list_for_courses(
        &self,
        course_ids: &[CourseId],
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentStoreError>;
}

/// One legacy membership relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEntry {
    /// The member student.
    pub student_id: UserId,
    /// The course the student is considered enrolled in.
    pub course_id: CourseId,
}

/// Persistence port for the legacy per-student membership lists.
///
/// Add and remove are idempotent: adding a present entry or removing an
/// absent one succeeds without effect.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// True when the student's list contains the course.
    async fn contains(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, MembershipStoreError>;

    /// Add the course to the student's list if absent.
    async fn add(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(), MembershipStoreError>;

    /// Remove the course from the student's list if present.
    async fn remove(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(), MembershipStoreError>;

    /// Every (student, course) membership whose course is in the given set,
    /// in directory iteration order.
    async fn entries_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<MembershipEntry>, MembershipStoreError>;
}

/// Lookup port for user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DirectoryError>;

    /// Fetch a user by email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, DirectoryError>;
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    /// Case-insensitive needle matched against title and description.
    pub search: Option<String>,
    /// Exact category tag.
    pub category: Option<String>,
}

/// Persistence port for courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Fetch a course by identifier.
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseStoreError>;

    /// One page of the catalog plus the total match count, newest first.
    async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Course>, u64), CourseStoreError>;

    /// Every course owned by the given teacher.
    async fn list_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> Result<Vec<Course>, CourseStoreError>;

    /// Insert a new course.
    async fn insert(&self, course: &Course) -> Result<(), CourseStoreError>;

    /// Persist changed fields of an existing course; returns whether the
    /// course existed.
    async fn update(&self, course: &Course) -> Result<bool, CourseStoreError>;

    /// Delete a course; returns whether one existed.
    async fn delete(&self, id: &CourseId) -> Result<bool, CourseStoreError>;
}

/// Persistence port for quizzes and attempts.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Insert a new quiz.
    async fn insert(&self, quiz: &Quiz) -> Result<(), QuizStoreError>;

    /// Fetch a quiz by identifier.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Quiz>, QuizStoreError>;

    /// Every quiz attached to a course, newest first.
    async fn list_for_course(&self, course_id: &CourseId) -> Result<Vec<Quiz>, QuizStoreError>;

    /// Insert a graded attempt.
    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<(), QuizStoreError>;

    /// Every attempt against a quiz, newest first.
    async fn list_attempts(&self, quiz_id: &Uuid) -> Result<Vec<QuizAttempt>, QuizStoreError>;
}

/// Persistence port for chat messages.
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    /// Insert a received message.
    async fn insert(&self, message: &ChatMessage) -> Result<(), ChatStoreError>;

    /// The most recent messages in a course room, oldest first, bounded by
    /// `limit`.
    async fn recent_for_course(
        &self,
        course_id: &CourseId,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ChatStoreError>;
}

/// Persistence port for payment records.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment record.
    async fn insert(&self, payment: &PaymentRecord) -> Result<(), PaymentStoreError>;

    /// Every payment recorded against a course, newest first.
    async fn list_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<PaymentRecord>, PaymentStoreError>;
}

// ---------------------------------------------------------------------------
// Driving ports: enrollment workflow
// ---------------------------------------------------------------------------

/// A student's request to enrol in a course.
#[derive(Debug, Clone)]
pub struct EnrollRequest {
    /// The enrolling student (must match the caller).
    pub student_id: UserId,
    /// The target course.
    pub course_id: CourseId,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Scope and filter for a teacher's enrollment listing.
#[derive(Debug, Clone)]
pub struct TeacherEnrollmentsQuery {
    /// The teacher whose courses are in scope.
    pub teacher_id: UserId,
    /// Restrict to one owned course when present.
    pub course_id: Option<CourseId>,
    /// Restrict explicit records to one status when present.
    pub status: Option<EnrollmentStatus>,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// A teacher's decision on an enrollment.
#[derive(Debug, Clone)]
pub struct DecideEnrollmentCommand {
    /// Composite identifier naming the pair.
    pub id: EnrollmentId,
    /// The new status: `accepted` or `rejected` only.
    pub status: EnrollmentStatus,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Removal of an enrollment.
#[derive(Debug, Clone)]
pub struct DeleteEnrollmentCommand {
    /// Composite identifier naming the pair.
    pub id: EnrollmentId,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Course half of a merged enrollment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    /// Course identifier.
    #[schema(value_type = String)]
    pub id: CourseId,
    /// Course title at listing time.
    #[schema(value_type = String)]
    pub title: CourseTitle,
}

/// Student half of a merged enrollment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    /// Student identifier.
    #[schema(value_type = String)]
    pub id: UserId,
    /// Given-name part of the display name.
    pub first_name: String,
    /// Family-name part of the display name (may be empty).
    pub last_name: String,
    /// Contact email.
    #[schema(value_type = String)]
    pub email: EmailAddress,
}

impl StudentSummary {
    /// Derive the summary from a directory record.
    pub fn from_user(user: &User) -> Self {
        let (first_name, last_name) = user.display_name().split_parts();
        Self {
            id: user.id().clone(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: user.email().clone(),
        }
    }
}

/// One logical row of the merged enrollment view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRow {
    /// Synthetic composite identifier for the pair.
    #[schema(value_type = String)]
    pub id: EnrollmentId,
    /// Course half of the pair.
    pub course: CourseSummary,
    /// Student half of the pair.
    pub student: StudentSummary,
    /// Status of the backing (possibly just-synthesised) record.
    pub status: EnrollmentStatus,
    /// Creation timestamp of the backing record.
    pub created_at: DateTime<Utc>,
}

/// Confirmation returned by a status decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDecision {
    /// Composite identifier of the decided pair.
    #[schema(value_type = String)]
    pub id: EnrollmentId,
    /// The status now on record.
    pub status: EnrollmentStatus,
}

/// The enrollment workflow engine's driving port.
///
/// Implementations orchestrate the record store, the legacy membership store,
/// and the directories; see the service documentation for the consistency
/// rules between the two stores.
#[async_trait]
pub trait EnrollmentWorkflow: Send + Sync {
    /// Create a `pending` record for the caller's own enrollment request.
    async fn request_enrollment(&self, request: EnrollRequest)
    -> Result<EnrollmentRecord, Error>;

    /// Report the pair's status, lazily migrating legacy membership data.
    async fn enrollment_status(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<LookupStatus, Error>;

    /// Merged enrollment listing across a teacher's courses.
    async fn list_for_teacher(
        &self,
        query: TeacherEnrollmentsQuery,
    ) -> Result<Vec<EnrollmentRow>, Error>;

    /// Approve or reject an enrollment and reconcile the membership list.
    async fn decide(&self, command: DecideEnrollmentCommand)
    -> Result<EnrollmentDecision, Error>;

    /// Remove an enrollment record and its membership entry, idempotently.
    async fn delete(&self, command: DeleteEnrollmentCommand) -> Result<(), Error>;
}

// ---------------------------------------------------------------------------
// Driving ports: surrounding features
// ---------------------------------------------------------------------------

/// Catalog listing query.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Search and category filters.
    pub filter: CourseFilter,
    /// Validated page coordinates.
    pub page: PageRequest,
}

/// Fields accepted when creating a course.
#[derive(Debug, Clone)]
pub struct CreateCourseCommand {
    /// Course title.
    pub title: CourseTitle,
    /// Catalog description.
    pub description: String,
    /// Category tag.
    pub category: String,
    /// Price in integer cents.
    pub price_cents: i64,
    /// Authenticated caller; becomes the instructor.
    pub caller: Caller,
}

/// Partial update for a course; absent fields keep their prior values.
#[derive(Debug, Clone)]
pub struct UpdateCourseCommand {
    /// The course to update.
    pub course_id: CourseId,
    /// Replacement title.
    pub title: Option<CourseTitle>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement price.
    pub price_cents: Option<i64>,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Lesson appended to a course.
#[derive(Debug, Clone)]
pub struct AddLessonCommand {
    /// The course to extend.
    pub course_id: CourseId,
    /// The lesson content; `order` is assigned by the course.
    pub lesson: Lesson,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Course catalog driving port.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// One page of the public catalog.
    async fn list(&self, query: CatalogQuery) -> Result<pagination::Paginated<Course>, Error>;

    /// Fetch a single course.
    async fn get(&self, id: &CourseId) -> Result<Course, Error>;

    /// Create a course owned by the calling teacher.
    async fn create(&self, command: CreateCourseCommand) -> Result<Course, Error>;

    /// Update an owned course.
    async fn update(&self, command: UpdateCourseCommand) -> Result<Course, Error>;

    /// Delete an owned course.
    async fn delete(&self, id: &CourseId, caller: &Caller) -> Result<(), Error>;

    /// Append a lesson to an owned course, returning it with its position.
    async fn add_lesson(&self, command: AddLessonCommand) -> Result<Lesson, Error>;

    /// Every course owned by a teacher (self or admin).
    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        caller: &Caller,
    ) -> Result<Vec<Course>, Error>;
}

/// Quiz creation fields.
#[derive(Debug, Clone)]
pub struct CreateQuizCommand {
    /// The owning course.
    pub course_id: CourseId,
    /// Quiz heading.
    pub title: String,
    /// Question set.
    pub questions: Vec<Question>,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Attempt submission fields.
#[derive(Debug, Clone)]
pub struct SubmitAttemptCommand {
    /// The quiz being attempted.
    pub quiz_id: Uuid,
    /// Chosen answer indices, aligned with the question order.
    pub answers: Vec<u32>,
    /// Authenticated caller identity (must be an accepted student).
    pub caller: Caller,
}

/// Quiz authoring and grading driving port.
#[async_trait]
pub trait QuizDesk: Send + Sync {
    /// Create a quiz under an owned course.
    async fn create(&self, command: CreateQuizCommand) -> Result<Quiz, Error>;

    /// Every quiz attached to a course.
    async fn list_for_course(&self, course_id: &CourseId) -> Result<Vec<Quiz>, Error>;

    /// Grade and persist an attempt.
    async fn submit_attempt(&self, command: SubmitAttemptCommand) -> Result<QuizAttempt, Error>;

    /// Every attempt against a quiz (course owner or admin).
    async fn list_attempts(
        &self,
        quiz_id: &Uuid,
        caller: &Caller,
    ) -> Result<Vec<QuizAttempt>, Error>;
}

/// A message posted into a course room.
#[derive(Debug, Clone)]
pub struct PostMessageCommand {
    /// The course room.
    pub course_id: CourseId,
    /// Validated message text.
    pub body: MessageBody,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Course chat driving port.
///
/// Access to a room requires the caller to own the course, hold the admin
/// role, or hold an `accepted` enrollment; the check consumes the
/// enrollment workflow's status query.
#[async_trait]
pub trait CourseChat: Send + Sync {
    /// Confirm the caller may read and post in the room.
    async fn authorise(&self, course_id: &CourseId, caller: &Caller) -> Result<(), Error>;

    /// Recent room history, oldest first.
    async fn history(
        &self,
        course_id: &CourseId,
        caller: &Caller,
    ) -> Result<Vec<ChatMessage>, Error>;

    /// Validate, persist, and return a message for fan-out.
    async fn post(&self, command: PostMessageCommand) -> Result<ChatMessage, Error>;
}

/// Payment recording fields.
#[derive(Debug, Clone)]
pub struct RecordPaymentCommand {
    /// The paying student (must match the caller).
    pub student_id: UserId,
    /// The course paid for.
    pub course_id: CourseId,
    /// Amount in integer cents.
    pub amount_cents: i64,
    /// Opaque client-supplied reference.
    pub reference: String,
    /// Authenticated caller identity.
    pub caller: Caller,
}

/// Payment log driving port.
#[async_trait]
pub trait PaymentLog: Send + Sync {
    /// Validate and record a payment.
    async fn record(&self, command: RecordPaymentCommand) -> Result<PaymentRecord, Error>;

    /// Every payment against a course (owner or admin).
    async fn list_for_course(
        &self,
        course_id: &CourseId,
        caller: &Caller,
    ) -> Result<Vec<PaymentRecord>, Error>;
}

/// Session identity driving port.
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Resolve an email to a directory record for session establishment.
    async fn login(&self, email: &EmailAddress) -> Result<User, Error>;

    /// Resolve a session user id to the caller identity.
    async fn resolve_caller(&self, user_id: &UserId) -> Result<Caller, Error>;

    /// The caller's own directory record.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;
}
