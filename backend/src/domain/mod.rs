//! Domain primitives, aggregates, ports, and services.
//!
//! Purpose: define the strongly typed entities of the platform and the
//! enrollment workflow engine that coordinates the record store and the
//! legacy membership lists. Types are immutable where possible and document
//! their invariants and serde contracts in Rustdoc.

pub mod account_service;
pub mod catalog_service;
pub mod chat;
pub mod chat_service;
pub mod course;
pub mod enrollment;
pub mod enrollments;
pub mod error;
pub mod payment;
pub mod payment_service;
pub mod policy;
pub mod ports;
pub mod quiz;
pub mod quiz_service;
pub mod user;

pub use self::account_service::AccountService;
pub use self::catalog_service::CatalogService;
pub use self::chat::{ChatMessage, ChatValidationError, MessageBody};
pub use self::chat_service::{CHAT_HISTORY_LIMIT, ChatService};
pub use self::course::{Course, CourseId, CourseTitle, CourseValidationError, Lesson};
pub use self::enrollment::{
    EnrollmentId, EnrollmentIdError, EnrollmentRecord, EnrollmentStatus, LookupStatus,
    UnknownStatus,
};
pub use self::enrollments::EnrollmentService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::payment::{PaymentRecord, PaymentValidationError};
pub use self::payment_service::PaymentService;
pub use self::policy::{AccessPolicy, Action, Caller, Decision, RolePolicy};
pub use self::quiz::{Question, Quiz, QuizAttempt, QuizValidationError};
pub use self::quiz_service::QuizService;
pub use self::user::{
    DisplayName, EmailAddress, Role, User, UserId, UserValidationError,
};
