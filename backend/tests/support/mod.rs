//! Shared helpers for the HTTP integration suites.
//!
//! Builds the full `/api/v1` surface over the in-memory adapters exposed by
//! the crate's `test-support` feature, so suites exercise the real handler
//! stack without a database.

use actix_web::cookie::Cookie;
use actix_web::{App, web};

use backend::domain::{
    Course, CourseId, CourseTitle, DisplayName, EmailAddress, Role, User, UserId,
};
use backend::inbound::http;
use backend::inbound::http::state::HttpState;
use backend::test_support::Platform;

/// Cookie-session middleware with a throwaway key.
pub fn test_session_middleware()
-> actix_session::SessionMiddleware<actix_session::storage::CookieSessionStore> {
    actix_session::SessionMiddleware::builder(
        actix_session::storage::CookieSessionStore::default(),
        actix_web::cookie::Key::generate(),
    )
    .cookie_name("session".into())
    .cookie_secure(false)
    .build()
}

/// The full `/api/v1` surface over the given state, session-wrapped.
pub fn api_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(state))
        .service(
            web::scope("/api/v1")
                .service(http::users::login)
                .service(http::users::logout)
                .service(http::users::me)
                .service(http::enrollments::request_enrollment)
                .service(http::enrollments::enrollment_status)
                .service(http::enrollments::teacher_enrollments)
                .service(http::enrollments::course_enrollments)
                .service(http::enrollments::update_enrollment_status)
                .service(http::enrollments::delete_enrollment)
                .service(http::courses::list_courses)
                .service(http::courses::get_course)
                .service(http::courses::create_course)
                .service(http::courses::update_course)
                .service(http::courses::delete_course)
                .service(http::courses::add_lesson)
                .service(http::courses::teacher_courses)
                .service(http::quizzes::create_quiz)
                .service(http::quizzes::course_quizzes)
                .service(http::quizzes::submit_attempt)
                .service(http::quizzes::quiz_attempts)
                .service(http::chat::chat_history)
                .service(http::payments::record_payment)
                .service(http::payments::course_payments),
        )
}

/// Log in through the real endpoint and return the session cookie.
pub async fn login_as<S>(app: &S, email: &str) -> Cookie<'static>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let request = actix_web::test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(serde_json::json!({ "email": email }))
        .to_request();
    let response = actix_web::test::call_service(app, request).await;
    assert!(
        response.status().is_success(),
        "login failed for {email}: {}",
        response.status()
    );
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie issued")
        .into_owned()
}

/// Insert a directory user with the given role.
pub fn seed_user(platform: &Platform, name: &str, email: &str, role: Role) -> User {
    let user = User::new(
        UserId::random(),
        DisplayName::new(name).expect("valid name"),
        EmailAddress::new(email).expect("valid email"),
        role,
    );
    platform.users.insert(user.clone());
    user
}

/// Insert a course owned by the given teacher.
pub fn seed_course(platform: &Platform, teacher: &User, title: &str) -> Course {
    let course = Course::new(
        CourseId::random(),
        CourseTitle::new(title).expect("valid title"),
        "",
        "programming",
        teacher.id().clone(),
        0,
        chrono::Utc::now(),
    )
    .expect("valid course");
    platform.courses.put(course.clone());
    course
}
