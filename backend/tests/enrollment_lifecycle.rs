//! End-to-end enrollment workflow behaviour over the HTTP surface.

mod support;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use serde_json::{Value, json};

use backend::domain::Role;
use backend::test_support::platform;
use support::{api_app, login_as, seed_course, seed_user};

#[actix_web::test]
async fn request_approve_inspect_and_delete_lifecycle() {
    let p = platform();
    let student = seed_user(&p, "Ada Lovelace", "ada@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    // No record and no membership: the sentinel, nothing persisted.
    let student_cookie = login_as(&app, "ada@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/enrollments/status?courseId={}", course.id))
            .cookie(student_cookie.clone())
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("status"),
        Some(&Value::String("not_enrolled".into()))
    );
    assert!(p.enrollments.is_empty());

    // The student requests enrollment.
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
    let record: Value = actix_test::read_body_json(response).await;
    let composite = record
        .get("id")
        .and_then(Value::as_str)
        .expect("composite id")
        .to_owned();

    // The teacher's dashboard shows the pending row with split name parts.
    let teacher_cookie = login_as(&app, "charles@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/teachers/{}/enrollments", teacher.id()))
            .cookie(teacher_cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing.pointer("/enrollments/0/status"),
        Some(&Value::String("pending".into()))
    );
    assert_eq!(
        listing.pointer("/enrollments/0/student/firstName"),
        Some(&Value::String("Ada".into()))
    );
    assert_eq!(
        listing.pointer("/enrollments/0/student/lastName"),
        Some(&Value::String("Lovelace".into()))
    );
    assert_eq!(
        listing.pointer("/enrollments/0/id"),
        Some(&Value::String(composite.clone()))
    );

    // Approval flips the status and adds the membership entry.
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/enrollments/{composite}/status"))
            .cookie(teacher_cookie.clone())
            .set_json(json!({ "status": "accepted" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let decision: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        decision.get("status"),
        Some(&Value::String("accepted".into()))
    );
    assert_eq!(p.users.membership_of(student.id()), vec![course.id.clone()]);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/enrollments/status?courseId={}", course.id))
            .cookie(student_cookie.clone())
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("status"), Some(&Value::String("accepted".into())));

    // Re-decision to rejected removes the membership entry again.
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/enrollments/{composite}/status"))
            .cookie(teacher_cookie.clone())
            .set_json(json!({ "status": "rejected" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(p.users.membership_of(student.id()).is_empty());

    // Deletion is idempotent: both calls succeed, nothing remains.
    for _ in 0..2 {
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/enrollments/{composite}"))
                .cookie(teacher_cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert!(p.enrollments.is_empty());
    assert!(p.users.membership_of(student.id()).is_empty());
}

#[actix_web::test]
async fn legacy_members_surface_in_teacher_listings_and_migrate() {
    let p = platform();
    let legacy = seed_user(&p, "Alan Turing", "alan@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    p.users
        .insert(legacy.clone().with_enrolled_courses(vec![course.id.clone()]));
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    let teacher_cookie = login_as(&app, "charles@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/teachers/{}/enrollments", teacher.id()))
            .cookie(teacher_cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing.pointer("/enrollments/0/status"),
        Some(&Value::String("accepted".into()))
    );
    assert_eq!(
        listing.pointer("/enrollments/0/id"),
        Some(&Value::String(format!("{}_{}", legacy.id(), course.id)))
    );
    assert_eq!(p.enrollments.len(), 1, "the listing migrated the pair");

    // A second read returns the now-explicit record without duplicating it.
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/teachers/{}/enrollments", teacher.id()))
            .cookie(teacher_cookie)
            .to_request(),
    )
    .await;
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing
            .get("enrollments")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(1)
    );
    assert_eq!(p.enrollments.len(), 1);
}

#[actix_web::test]
async fn course_scoped_listing_honours_the_status_filter() {
    let p = platform();
    seed_user(&p, "Ada Lovelace", "ada@example.com", Role::Student);
    seed_user(&p, "Grace Hopper", "grace@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    for email in ["ada@example.com", "grace@example.com"] {
        let cookie = login_as(&app, email).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/enrollments")
                .cookie(cookie)
                .set_json(json!({ "courseId": course.id.to_string() }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let teacher_cookie = login_as(&app, "charles@example.com").await;
    let pending_uri = format!(
        "/api/v1/courses/{}/enrollments?status=pending",
        course.id
    );
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&pending_uri)
            .cookie(teacher_cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing
            .get("enrollments")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(2)
    );

    let accepted_uri = format!(
        "/api/v1/courses/{}/enrollments?status=accepted",
        course.id
    );
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&accepted_uri)
            .cookie(teacher_cookie)
            .to_request(),
    )
    .await;
    let listing: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        listing
            .get("enrollments")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(0)
    );
}

#[actix_web::test]
async fn admins_may_decide_other_teachers_enrollments() {
    let p = platform();
    let student = seed_user(&p, "Ada Lovelace", "ada@example.com", Role::Student);
    let teacher = seed_user(&p, "Charles Babbage", "charles@example.com", Role::Teacher);
    seed_user(&p, "Site Admin", "admin@example.com", Role::Admin);
    let course = seed_course(&p, &teacher, "Analytical Engines");
    let app = actix_test::init_service(api_app(p.state.clone())).await;

    let student_cookie = login_as(&app, "ada@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/enrollments")
            .cookie(student_cookie)
            .set_json(json!({ "courseId": course.id.to_string() }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let admin_cookie = login_as(&app, "admin@example.com").await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!(
                "/api/v1/enrollments/{}_{}/status",
                student.id(),
                course.id
            ))
            .cookie(admin_cookie)
            .set_json(json!({ "status": "accepted" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(p.users.membership_of(student.id()), vec![course.id.clone()]);
}
