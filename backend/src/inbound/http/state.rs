//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    Accounts, CourseCatalog, CourseChat, EnrollmentWorkflow, PaymentLog, QuizDesk,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Session identity resolution.
    pub accounts: Arc<dyn Accounts>,
    /// The enrollment workflow engine.
    pub enrollments: Arc<dyn EnrollmentWorkflow>,
    /// Course catalog use-cases.
    pub catalog: Arc<dyn CourseCatalog>,
    /// Quiz authoring and grading use-cases.
    pub quizzes: Arc<dyn QuizDesk>,
    /// Course chat history and access checks.
    pub chat: Arc<dyn CourseChat>,
    /// Payment recording use-cases.
    pub payments: Arc<dyn PaymentLog>,
}
