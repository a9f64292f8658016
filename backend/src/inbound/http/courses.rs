//! Course catalog API handlers.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use pagination::{PageRequest, Paginated};

use crate::domain::ports::{
    AddLessonCommand, CatalogQuery, CourseCatalog, CourseFilter, CreateCourseCommand,
    UpdateCourseCommand,
};
use crate::domain::{Course, CourseId, CourseTitle, Error, Lesson, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_caller;
use crate::inbound::http::enrollments::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Catalog listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogParams {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    category: Option<String>,
}

/// Body accepted when creating a course.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseBody {
    /// Course title.
    pub title: String,
    /// Catalog description.
    #[serde(default)]
    pub description: String,
    /// Category tag.
    #[serde(default)]
    pub category: String,
    /// Price in integer cents.
    #[serde(default)]
    pub price_cents: i64,
}

/// Body accepted when updating a course; absent fields keep prior values.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseBody {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement price.
    pub price_cents: Option<i64>,
}

/// Body accepted when appending a lesson.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonBody {
    /// Lesson heading.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Link to the hosted lesson video.
    #[serde(default)]
    pub video_url: String,
    /// Expected duration in minutes.
    #[serde(default)]
    pub duration_minutes: u32,
}

/// Envelope for a teacher's course listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseListResponse {
    /// Courses owned by the teacher, newest first.
    pub courses: Vec<Course>,
}

fn parse_course_id(raw: &str) -> Result<CourseId, Error> {
    CourseId::new(raw).map_err(|_| {
        Error::invalid_request("course id must be a valid UUID")
            .with_details(json!({ "field": "courseId" }))
    })
}

fn parse_title(raw: String) -> Result<CourseTitle, Error> {
    CourseTitle::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "title" }))
    })
}

/// Browse the public catalog.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(
        ("page" = Option<u32>, Query, description = "Page number, from 1"),
        ("perPage" = Option<u32>, Query, description = "Items per page"),
        ("search" = Option<String>, Query, description = "Title/description needle"),
        ("category" = Option<String>, Query, description = "Exact category tag")
    ),
    responses(
        (status = 200, description = "One catalog page of courses"),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCourses",
    security([])
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    params: web::Query<CatalogParams>,
) -> ApiResult<web::Json<Paginated<Course>>> {
    let params = params.into_inner();
    let page = PageRequest::from_params(params.page, params.per_page)
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let listing = state
        .catalog
        .list(CatalogQuery {
            filter: CourseFilter {
                search: params.search,
                category: params.category,
            },
            page,
        })
        .await?;
    Ok(web::Json(listing))
}

/// Fetch one course.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "The course", body = Course),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "getCourse",
    security([])
)]
#[get("/courses/{id}")]
pub async fn get_course(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Course>> {
    let course_id = parse_course_id(&path.into_inner())?;
    let course = state.catalog.get(&course_id).await?;
    Ok(web::Json(course))
}

/// Publish a new course.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseBody,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["courses"],
    operation_id = "createCourse"
)]
#[post("/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCourseBody>,
) -> ApiResult<HttpResponse> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let payload = payload.into_inner();
    let course = state
        .catalog
        .create(CreateCourseCommand {
            title: parse_title(payload.title)?,
            description: payload.description,
            category: payload.category,
            price_cents: payload.price_cents,
            caller,
        })
        .await?;
    Ok(HttpResponse::Created().json(course))
}

/// Update an owned course.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course identifier")),
    request_body = UpdateCourseBody,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "updateCourse"
)]
#[put("/courses/{id}")]
pub async fn update_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateCourseBody>,
) -> ApiResult<web::Json<Course>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    let payload = payload.into_inner();
    let course = state
        .catalog
        .update(UpdateCourseCommand {
            course_id,
            title: payload.title.map(parse_title).transpose()?,
            description: payload.description,
            category: payload.category,
            price_cents: payload.price_cents,
            caller,
        })
        .await?;
    Ok(web::Json(course))
}

/// Delete an owned course.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course removed", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "deleteCourse"
)]
#[delete("/courses/{id}")]
pub async fn delete_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    state.catalog.delete(&course_id, &caller).await?;
    Ok(web::Json(MessageResponse {
        message: "course removed".into(),
    }))
}

/// Append a lesson to an owned course.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/lessons",
    params(("id" = String, Path, description = "Course identifier")),
    request_body = LessonBody,
    responses(
        (status = 201, description = "Lesson appended", body = Lesson),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "addLesson"
)]
#[post("/courses/{id}/lessons")]
pub async fn add_lesson(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<LessonBody>,
) -> ApiResult<HttpResponse> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    let payload = payload.into_inner();
    let lesson = state
        .catalog
        .add_lesson(AddLessonCommand {
            course_id,
            lesson: Lesson {
                title: payload.title,
                description: payload.description,
                video_url: payload.video_url,
                duration_minutes: payload.duration_minutes,
                order: 0,
            },
            caller,
        })
        .await?;
    Ok(HttpResponse::Created().json(lesson))
}

/// Every course owned by a teacher.
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/courses",
    params(("id" = String, Path, description = "Teacher identifier")),
    responses(
        (status = 200, description = "The teacher's courses", body = CourseListResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Teacher not found", body = Error)
    ),
    tags = ["courses"],
    operation_id = "teacherCourses"
)]
#[get("/teachers/{id}/courses")]
pub async fn teacher_courses(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseListResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let teacher_id = UserId::new(path.into_inner()).map_err(|_| {
        Error::invalid_request("teacher id must be a valid UUID")
            .with_details(json!({ "field": "teacherId" }))
    })?;
    let courses = state
        .catalog
        .list_for_teacher(&teacher_id, &caller)
        .await?;
    Ok(web::Json(CourseListResponse { courses }))
}
