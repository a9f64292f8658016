//! Course chat data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::course::CourseId;
use super::user::UserId;

/// Maximum length of a chat message body.
pub const MESSAGE_BODY_MAX: usize = 2_000;

/// Validation errors returned by the chat constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatValidationError {
    EmptyBody,
    BodyTooLong { max: usize },
}

impl fmt::Display for ChatValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "message body must not be empty"),
            Self::BodyTooLong { max } => {
                write!(f, "message body must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ChatValidationError {}

/// Validated chat message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    /// Validate and construct a [`MessageBody`].
    pub fn new(body: impl Into<String>) -> Result<Self, ChatValidationError> {
        Self::from_owned(body.into())
    }

    fn from_owned(body: String) -> Result<Self, ChatValidationError> {
        if body.trim().is_empty() {
            return Err(ChatValidationError::EmptyBody);
        }
        if body.chars().count() > MESSAGE_BODY_MAX {
            return Err(ChatValidationError::BodyTooLong {
                max: MESSAGE_BODY_MAX,
            });
        }
        Ok(Self(body))
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ChatValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// One persisted chat message in a course room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Stable message identifier.
    pub id: Uuid,
    /// Course room the message was posted in.
    #[schema(value_type = String)]
    pub course_id: CourseId,
    /// Author of the message.
    #[schema(value_type = String)]
    pub sender_id: UserId,
    /// Message text.
    #[schema(value_type = String)]
    pub body: MessageBody,
    /// Server-side receipt timestamp.
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Stamp a new message on receipt.
    pub fn new(
        course_id: CourseId,
        sender_id: UserId,
        body: MessageBody,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            sender_id,
            body,
            sent_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   \n ")]
    fn body_rejects_blank_input(#[case] raw: &str) {
        let err = MessageBody::new(raw).expect_err("blank body rejected");
        assert_eq!(err, ChatValidationError::EmptyBody);
    }

    #[rstest]
    fn body_rejects_oversized_input() {
        let raw = "x".repeat(MESSAGE_BODY_MAX + 1);
        let err = MessageBody::new(raw).expect_err("oversized body rejected");
        assert_eq!(
            err,
            ChatValidationError::BodyTooLong {
                max: MESSAGE_BODY_MAX
            }
        );
    }

    #[rstest]
    fn body_accepts_regular_text() {
        let body = MessageBody::new("anyone stuck on lesson 3?").expect("valid body");
        assert_eq!(body.as_ref(), "anyone stuck on lesson 3?");
    }
}
