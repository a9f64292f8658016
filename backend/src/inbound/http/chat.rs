//! Chat history API handler.
//!
//! Live messaging runs over the WebSocket adapter; this endpoint serves the
//! recent history so clients can backfill a room on join.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::CourseChat;
use crate::domain::{ChatMessage, CourseId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_caller;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Envelope for chat history reads.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatHistoryResponse {
    /// Recent messages, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// Recent messages in a course room.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/chat/messages",
    params(("id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Recent room history", body = ChatHistoryResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "An accepted enrollment is required", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["chat"],
    operation_id = "chatHistory"
)]
#[get("/courses/{id}/chat/messages")]
pub async fn chat_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ChatHistoryResponse>> {
    let caller = require_caller(state.accounts.as_ref(), &session).await?;
    let course_id = CourseId::new(path.into_inner()).map_err(|_| {
        Error::invalid_request("course id must be a valid UUID")
            .with_details(json!({ "field": "courseId" }))
    })?;
    let messages = state.chat.history(&course_id, &caller).await?;
    Ok(web::Json(ChatHistoryResponse { messages }))
}
