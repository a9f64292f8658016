//! Catalog, quiz, chat, and payment behaviour over the HTTP surface.

mod support;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use serde_json::{Value, json};

use backend::domain::Role;
use backend::test_support::platform;
use support::{api_app, login_as, seed_course, seed_user};

#[actix_web::test]
async fn catalog_pages_and_filters() {
    let p = platform();
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    for index in 0..3 {
        seed_course(&p, &teacher, &format!("Engines volume {index}"));
    }
    seed_course(&p, &teacher, "Watercolour Painting");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/courses?page=1&perPage=2")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(listing.get("total"), Some(&Value::from(4)));
    assert_eq!(listing.get("pages"), Some(&Value::from(2)));
    assert_eq!(
        listing.get("items").and_then(Value::as_array).map(Vec::len),
        Some(2)
    );

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/courses?search=watercolour")
            .to_request(),
    )
    .await;
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(listing.get("total"), Some(&Value::from(1)));

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/courses?page=0")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn quiz_lifecycle_requires_an_accepted_enrollment() {
    let p = platform();
    let student = seed_user(&p, "Ada Lovelace", "ada@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    let teacher_cookie = login_as(&app, "charles@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/courses/{}/quizzes", course.id))
            .cookie(teacher_cookie.clone())
            .set_json(json!({
                "title": "Week 1",
                "questions": [{
                    "prompt": "Which keyword borrows?",
                    "choices": ["let", "ref"],
                    "correctChoice": 1,
                    "points": 5
                }]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let quiz: Value = actix_test::read_body_json(response).await;
    let quiz_id = quiz.get("id").and_then(Value::as_str).expect("quiz id").to_owned();

    // Not yet enrolled: refused.
    let student_cookie = login_as(&app, "ada@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/quizzes/{quiz_id}/attempts"))
            .cookie(student_cookie.clone())
            .set_json(json!({ "answers": [1] }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Enrol and approve, then the attempt goes through and is graded.
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/enrollments")
            .cookie(student_cookie.clone())
            .set_json(json!({ "courseId": course.id.to_string() }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!(
                "/api/v1/enrollments/{}_{}/status",
                student.id(),
                course.id
            ))
            .cookie(teacher_cookie.clone())
            .set_json(json!({ "status": "accepted" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/quizzes/{quiz_id}/attempts"))
            .cookie(student_cookie)
            .set_json(json!({ "answers": [0] }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let attempt: Value = actix_test::read_body_json(response).await;
    assert_eq!(attempt.get("score"), Some(&Value::from(0)));
    assert_eq!(attempt.get("maxScore"), Some(&Value::from(5)));

    // The owner reviews the attempt.
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/quizzes/{quiz_id}/attempts"))
            .cookie(teacher_cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing
            .get("attempts")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(1)
    );
}

#[actix_web::test]
async fn chat_history_follows_enrollment_state() {
    let p = platform();
    let student = seed_user(&p, "Ada Lovelace", "ada@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    let history_uri = format!("/api/v1/courses/{}/chat/messages", course.id);

    // The owner always has room access.
    let teacher_cookie = login_as(&app, "charles@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&history_uri)
            .cookie(teacher_cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A student needs an accepted enrollment.
    let student_cookie = login_as(&app, "ada@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&history_uri)
            .cookie(student_cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/enrollments")
            .cookie(student_cookie.clone())
            .set_json(json!({ "courseId": course.id.to_string() }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!(
                "/api/v1/enrollments/{}_{}/status",
                student.id(),
                course.id
            ))
            .cookie(teacher_cookie)
            .set_json(json!({ "status": "accepted" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&history_uri)
            .cookie(student_cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn payments_record_and_list_for_course_staff() {
    let p = platform();
    seed_user(&p, "Ada Lovelace", "ada@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    let student_cookie = login_as(&app, "ada@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments")
            .cookie(student_cookie.clone())
            .set_json(json!({
                "courseId": course.id.to_string(),
                "amountCents": 4_900,
                "reference": "bank-2025-06-001"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Students cannot read the course's payment list.
    let payments_uri = format!("/api/v1/courses/{}/payments", course.id);
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&payments_uri)
            .cookie(student_cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let teacher_cookie = login_as(&app, "charles@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&payments_uri)
            .cookie(teacher_cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing.pointer("/payments/0/amountCents"),
        Some(&Value::from(4_900))
    );
}
