//! Payment API handlers.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{PaymentLog, RecordPaymentCommand};
use crate::domain::{CourseId, Error, PaymentRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_caller;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Body accepted when recording a payment.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentBody {
    /// The course paid for.
    pub course_id: String,
    /// Amount in integer cents.
    pub amount_cents: i64,
    /// Opaque client-supplied reference.
    pub reference: String,
}

/// Envelope for course payment listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentListResponse {
    /// Payments recorded against the course, newest first.
    pub payments: Vec<PaymentRecord>,
}

fn parse_course_id(raw: &str) -> Result<CourseId, Error> {
    CourseId::new(raw).map_err(|_| {
        Error::invalid_request("course id must be a valid UUID")
            .with_details(json!({ "field": "courseId" }))
    })
}

/// Record a payment for the calling student.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = RecordPaymentBody,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentRecord),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Student or course not found", body = Error)
    ),
    tags = ["payments"],
    operation_id = "recordPayment"
)]
#[post("/payments")]
pub async fn record_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecordPaymentBody>,
) -> ApiResult<HttpResponse> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let payload = payload.into_inner();
    let record = state
        .payments
        .record(RecordPaymentCommand {
            student_id: caller.user_id.clone(),
            course_id: parse_course_id(&payload.course_id)?,
            amount_cents: payload.amount_cents,
            reference: payload.reference,
            caller,
        })
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// List payments recorded against a course (course staff only).
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/payments",
    params(("id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Payments for the course", body = PaymentListResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["payments"],
    operation_id = "coursePayments"
)]
#[get("/courses/{id}/payments")]
pub async fn course_payments(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PaymentListResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = parse_course_id(&path.into_inner())?;
    let payments = state
        .payments
        .list_for_course(&course_id, &caller)
        .await?;
    Ok(web::Json(PaymentListResponse { payments }))
}
