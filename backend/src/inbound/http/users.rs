//! Session and profile API handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"ada@example.com"}
//! GET  /api/v1/users/me
//! ```
//!
//! Authentication mechanics are out of scope for this service: login
//! resolves an email through the directory and stores the user id in the
//! cookie session. Anything stronger belongs in front of this API.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::Accounts;
use crate::domain::{EmailAddress, Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// Directory email address.
    pub email: String,
}

/// Establish a session for a directory user.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unknown email", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let email = EmailAddress::new(payload.into_inner().email).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "email" }))
    })?;
    let user = state.accounts.login(&email).await?;
    session.persist_user(user.id())?;
    Ok(web::Json(user))
}

/// Drop the caller's session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> actix_web::HttpResponse {
    session.clear();
    actix_web::HttpResponse::NoContent().finish()
}

/// The caller's own directory record.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "The caller's record", body = User),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "me"
)]
#[get("/users/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    let user = state.accounts.profile(&user_id).await?;
    Ok(web::Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, Role, UserId};
    use crate::inbound::http::test_utils::{api_test_app, login_as};
    use crate::test_support::platform;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[actix_web::test]
    async fn login_issues_session_and_me_reads_it_back() {
        let p = platform();
        p.users.insert(User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            Role::Student,
        ));
        let app = actix_test::init_service(api_test_app(p.state.clone())).await;

        let cookie = login_as(&app, "ada@example.com").await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body.get("displayName"),
            Some(&Value::String("Ada Lovelace".into()))
        );
        assert_eq!(body.get("role"), Some(&Value::String("student".into())));
    }

    #[rstest]
    #[actix_web::test]
    async fn logout_clears_the_session() {
        let p = platform();
        p.users.insert(User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            Role::Student,
        ));
        let app = actix_test::init_service(api_test_app(p.state.clone())).await;
        let cookie = login_as(&app, "ada@example.com").await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Without the (now expired) cookie the caller is anonymous again.
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_emails_are_unauthorised() {
        let p = platform();
        let app = actix_test::init_service(api_test_app(p.state.clone())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequest {
                    email: "nobody@example.com".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_emails_are_bad_requests() {
        let p = platform();
        let app = actix_test::init_service(api_test_app(p.state.clone())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequest {
                    email: "not-an-email".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body.pointer("/details/field"),
            Some(&Value::String("email".into()))
        );
    }
}
