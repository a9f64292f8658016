//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for
//! the REST API: every HTTP endpoint from the inbound layer, the shared
//! error schema, and the session cookie security scheme. Swagger UI serves
//! the document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{CourseSummary, EnrollmentDecision, EnrollmentRow, StudentSummary};
use crate::domain::{
    ChatMessage, Course, EnrollmentStatus, Error, ErrorCode, Lesson, LookupStatus, PaymentRecord,
    Question, QuizAttempt, Role, User,
};
use crate::inbound::http::chat::ChatHistoryResponse;
use crate::inbound::http::courses::{
    CourseListResponse, CreateCourseBody, LessonBody, UpdateCourseBody,
};
use crate::inbound::http::enrollments::{
    DecisionBody, EnrollBody, EnrollmentListResponse, EnrollmentRecordResponse, MessageResponse,
    StatusResponse,
};
use crate::inbound::http::payments::{PaymentListResponse, RecordPaymentBody};
use crate::inbound::http::quizzes::{
    AttemptBody, AttemptListResponse, CreateQuizBody, QuestionBody, QuestionView, QuizListResponse,
    QuizView,
};
use crate::inbound::http::users::LoginRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Learning platform backend API",
        description = "Course catalog, enrollment workflow, quizzes, chat history, and payments.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::me,
        crate::inbound::http::enrollments::request_enrollment,
        crate::inbound::http::enrollments::enrollment_status,
        crate::inbound::http::enrollments::teacher_enrollments,
        crate::inbound::http::enrollments::course_enrollments,
        crate::inbound::http::enrollments::update_enrollment_status,
        crate::inbound::http::enrollments::delete_enrollment,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::get_course,
        crate::inbound::http::courses::create_course,
        crate::inbound::http::courses::update_course,
        crate::inbound::http::courses::delete_course,
        crate::inbound::http::courses::add_lesson,
        crate::inbound::http::courses::teacher_courses,
        crate::inbound::http::quizzes::create_quiz,
        crate::inbound::http::quizzes::course_quizzes,
        crate::inbound::http::quizzes::submit_attempt,
        crate::inbound::http::quizzes::quiz_attempts,
        crate::inbound::http::chat::chat_history,
        crate::inbound::http::payments::record_payment,
        crate::inbound::http::payments::course_payments,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        Course,
        Lesson,
        EnrollmentStatus,
        LookupStatus,
        EnrollmentRow,
        CourseSummary,
        StudentSummary,
        EnrollmentDecision,
        Question,
        QuizAttempt,
        ChatMessage,
        PaymentRecord,
        LoginRequest,
        EnrollBody,
        EnrollmentRecordResponse,
        StatusResponse,
        EnrollmentListResponse,
        DecisionBody,
        MessageResponse,
        CreateCourseBody,
        UpdateCourseBody,
        LessonBody,
        CourseListResponse,
        CreateQuizBody,
        QuestionBody,
        QuizView,
        QuestionView,
        QuizListResponse,
        AttemptBody,
        AttemptListResponse,
        ChatHistoryResponse,
        RecordPaymentBody,
        PaymentListResponse,
    )),
    tags(
        (name = "users", description = "Session and profile operations"),
        (name = "enrollments", description = "The enrollment approval workflow"),
        (name = "courses", description = "Catalog and lesson authoring"),
        (name = "quizzes", description = "Quiz authoring and graded attempts"),
        (name = "chat", description = "Course chat history"),
        (name = "payments", description = "Payment recording"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI document structure.

    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn openapi_registers_the_enrollment_workflow_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/enrollments",
            "/api/v1/enrollments/status",
            "/api/v1/teachers/{id}/enrollments",
            "/api/v1/courses/{id}/enrollments",
            "/api/v1/enrollments/{id}/status",
            "/api/v1/enrollments/{id}",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path {path} in OpenAPI document"
            );
        }
    }

    #[test]
    fn openapi_error_schema_is_registered() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        assert!(
            schemas.keys().any(|name| name.ends_with("Error")),
            "Error schema missing"
        );
    }
}
