//! Enrollment workflow API handlers.
//!
//! ```text
//! POST   /api/v1/enrollments                    {"courseId":"..."}
//! GET    /api/v1/enrollments/status?courseId=...
//! GET    /api/v1/teachers/{id}/enrollments?status=...
//! GET    /api/v1/courses/{id}/enrollments?status=...
//! PUT    /api/v1/enrollments/{id}/status        {"status":"accepted"}
//! DELETE /api/v1/enrollments/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{
    CourseCatalog, DecideEnrollmentCommand, DeleteEnrollmentCommand, EnrollRequest,
    EnrollmentDecision, EnrollmentRow, EnrollmentWorkflow, TeacherEnrollmentsQuery,
};
use crate::domain::{
    CourseId, EnrollmentId, EnrollmentRecord, EnrollmentStatus, Error, LookupStatus, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_caller;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Body of a student's enrollment request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
    /// The course to request enrollment in.
    pub course_id: String,
}

/// Wire form of an enrollment record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecordResponse {
    /// Composite identifier for the pair.
    pub id: String,
    /// The enrolling student.
    pub student_id: String,
    /// The target course.
    pub course_id: String,
    /// Current workflow state.
    pub status: EnrollmentStatus,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<EnrollmentRecord> for EnrollmentRecordResponse {
    fn from(record: EnrollmentRecord) -> Self {
        Self {
            id: record.composite_id().to_string(),
            student_id: record.student_id.to_string(),
            course_id: record.course_id.to_string(),
            status: record.status,
            created_at: record.created_at,
        }
    }
}

/// Answer to a status lookup.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// The pair's status, or the `not_enrolled` sentinel.
    pub status: LookupStatus,
}

/// Query parameters for the status lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    course_id: String,
}

/// Optional status filter on listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

/// Envelope for merged enrollment listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentListResponse {
    /// One logical row per (student, course) pair.
    pub enrollments: Vec<EnrollmentRow>,
}

/// Body of a teacher's decision.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DecisionBody {
    /// `accepted` or `rejected`.
    pub status: String,
}

/// Confirmation message envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

fn parse_course_id(raw: &str) -> Result<CourseId, Error> {
    CourseId::new(raw).map_err(|_| {
        Error::invalid_request("course id must be a valid UUID")
            .with_details(json!({ "field": "courseId" }))
    })
}

fn parse_teacher_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| {
        Error::invalid_request("teacher id must be a valid UUID")
            .with_details(json!({ "field": "teacherId" }))
    })
}

fn parse_enrollment_id(raw: &str) -> Result<EnrollmentId, Error> {
    EnrollmentId::parse(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "enrollmentId" }))
    })
}

fn parse_decision_status(raw: &str) -> Result<EnrollmentStatus, Error> {
    match raw {
        "accepted" => Ok(EnrollmentStatus::Accepted),
        "rejected" => Ok(EnrollmentStatus::Rejected),
        _ => Err(
            Error::invalid_request("status must be \"accepted\" or \"rejected\"")
                .with_details(json!({ "field": "status" })),
        ),
    }
}

/// Unknown filter values are ignored rather than rejected, so older clients
/// sending arbitrary filters keep working.
fn parse_status_filter(raw: Option<&str>) -> Option<EnrollmentStatus> {
    raw.and_then(|value| value.parse().ok())
}

/// Request enrollment in a course.
///
/// The student is the authenticated caller; pending requests do not touch
/// the membership list.
#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    request_body = EnrollBody,
    responses(
        (status = 201, description = "Enrollment requested", body = EnrollmentRecordResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Student or course not found", body = Error),
        (status = 409, description = "An enrollment already exists", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "requestEnrollment"
)]
#[post("/enrollments")]
pub async fn request_enrollment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<EnrollBody>,
) -> ApiResult<HttpResponse> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&payload.course_id)?;
    let record = state
        .enrollments
        .request_enrollment(EnrollRequest {
            student_id: caller.user_id.clone(),
            course_id,
            caller,
        })
        .await?;
    Ok(HttpResponse::Created().json(EnrollmentRecordResponse::from(record)))
}

/// Check the caller's enrollment status for one course.
///
/// Reads may write: a legacy membership entry without a record is migrated
/// into an `accepted` record on first lookup.
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/status",
    params(("courseId" = String, Query, description = "Course identifier")),
    responses(
        (status = 200, description = "Status for the pair", body = StatusResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Student or course not found", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "enrollmentStatus"
)]
#[get("/enrollments/status")]
pub async fn enrollment_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<StatusQuery>,
) -> ApiResult<web::Json<StatusResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&query.course_id)?;
    let status = state
        .enrollments
        .enrollment_status(&caller.user_id, &course_id)
        .await?;
    Ok(web::Json(StatusResponse { status }))
}

/// Merged enrollment listing across all of a teacher's courses.
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/enrollments",
    params(
        ("id" = String, Path, description = "Teacher identifier"),
        ("status" = Option<String>, Query, description = "Optional status filter")
    ),
    responses(
        (status = 200, description = "Merged enrollment rows", body = EnrollmentListResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Teacher not found", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "teacherEnrollments"
)]
#[get("/teachers/{id}/enrollments")]
pub async fn teacher_enrollments(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<EnrollmentListResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let teacher_id = parse_teacher_id(&path.into_inner())?;
    let enrollments = state
        .enrollments
        .list_for_teacher(TeacherEnrollmentsQuery {
            teacher_id,
            course_id: None,
            status: parse_status_filter(query.status.as_deref()),
            caller,
        })
        .await?;
    Ok(web::Json(EnrollmentListResponse { enrollments }))
}

/// Merged enrollment listing for one course.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/enrollments",
    params(
        ("id" = String, Path, description = "Course identifier"),
        ("status" = Option<String>, Query, description = "Optional status filter")
    ),
    responses(
        (status = 200, description = "Merged enrollment rows", body = EnrollmentListResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "courseEnrollments"
)]
#[get("/courses/{id}/enrollments")]
pub async fn course_enrollments(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<EnrollmentListResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    // Resolve the course first so a missing course reads as 404 rather than
    // leaking through the ownership check.
    let course = state.catalog.get(&course_id).await?;
    let enrollments = state
        .enrollments
        .list_for_teacher(TeacherEnrollmentsQuery {
            teacher_id: course.instructor_id.clone(),
            course_id: Some(course_id),
            status: parse_status_filter(query.status.as_deref()),
            caller,
        })
        .await?;
    Ok(web::Json(EnrollmentListResponse { enrollments }))
}

/// Approve or reject an enrollment.
#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{id}/status",
    params(("id" = String, Path, description = "Composite enrollment identifier")),
    request_body = DecisionBody,
    responses(
        (status = 200, description = "Decision applied", body = EnrollmentDecision),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course, student, or enrollment not found", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "updateEnrollmentStatus"
)]
#[put("/enrollments/{id}/status")]
pub async fn update_enrollment_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DecisionBody>,
) -> ApiResult<web::Json<EnrollmentDecision>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let id = parse_enrollment_id(&path.into_inner())?;
    let status = parse_decision_status(&payload.status)?;
    let decision = state
        .enrollments
        .decide(DecideEnrollmentCommand { id, status, caller })
        .await?;
    Ok(web::Json(decision))
}

/// Delete an enrollment and its membership entry.
///
/// Idempotent: deleting an absent record still succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/enrollments/{id}",
    params(("id" = String, Path, description = "Composite enrollment identifier")),
    responses(
        (status = 200, description = "Enrollment removed", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Student or course not found", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "deleteEnrollment"
)]
#[delete("/enrollments/{id}")]
pub async fn delete_enrollment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let id = parse_enrollment_id(&path.into_inner())?;
    state
        .enrollments
        .delete(DeleteEnrollmentCommand { id, caller })
        .await?;
    Ok(web::Json(MessageResponse {
        message: "enrollment deleted".into(),
    }))
}
