//! Shared helpers for HTTP handler tests.

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, web};

use crate::inbound::http::state::HttpState;

/// Cookie-session middleware with a throwaway key for tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .build()
}

/// The full `/api/v1` surface over the given state, session-wrapped.
pub fn api_test_app(
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
                .service(crate::inbound::http::users::login)
                .service(crate::inbound::http::users::logout)
                .service(crate::inbound::http::users::me)
                .service(crate::inbound::http::enrollments::request_enrollment)
                .service(crate::inbound::http::enrollments::enrollment_status)
                .service(crate::inbound::http::enrollments::teacher_enrollments)
                .service(crate::inbound::http::enrollments::course_enrollments)
                .service(crate::inbound::http::enrollments::update_enrollment_status)
                .service(crate::inbound::http::enrollments::delete_enrollment)
                .service(crate::inbound::http::courses::list_courses)
                .service(crate::inbound::http::courses::get_course)
                .service(crate::inbound::http::courses::create_course)
                .service(crate::inbound::http::courses::update_course)
                .service(crate::inbound::http::courses::delete_course)
                .service(crate::inbound::http::courses::add_lesson)
                .service(crate::inbound::http::courses::teacher_courses)
                .service(crate::inbound::http::quizzes::create_quiz)
                .service(crate::inbound::http::quizzes::course_quizzes)
                .service(crate::inbound::http::quizzes::submit_attempt)
                .service(crate::inbound::http::quizzes::quiz_attempts)
                .service(crate::inbound::http::chat::chat_history)
                .service(crate::inbound::http::payments::record_payment)
                .service(crate::inbound::http::payments::course_payments),
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
