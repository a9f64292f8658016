//! Course chat domain service.
//!
//! Room access composes two checks: the policy admits course staff (owner or
//! admin), and students are admitted through an `accepted` enrollment. The
//! latter consumes the workflow's status query, so legacy members are lazily
//! migrated the first time they open a room.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::policy::{AccessPolicy, Action, Caller};
use crate::domain::ports::{
    ChatMessageRepository, ChatStoreError, CourseChat, CourseRepository, CourseStoreError,
    EnrollmentWorkflow, PostMessageCommand,
};
use crate::domain::{ChatMessage, Course, CourseId, Error, LookupStatus};

/// Number of messages returned by a history read.
pub const CHAT_HISTORY_LIMIT: i64 = 50;

/// Chat service implementing the [`CourseChat`] driving port.
#[derive(Clone)]
pub struct ChatService<Ch, C> {
    messages: Arc<Ch>,
    courses: Arc<C>,
    enrollment: Arc<dyn EnrollmentWorkflow>,
    policy: Arc<dyn AccessPolicy>,
}

impl<Ch, C> ChatService<Ch, C> {
    /// Create a new service with the given stores and collaborators.
    pub fn new(
        messages: Arc<Ch>,
        courses: Arc<C>,
        enrollment: Arc<dyn EnrollmentWorkflow>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            messages,
            courses,
            enrollment,
            policy,
        }
    }
}

impl<Ch, C> ChatService<Ch, C>
where
    Ch: ChatMessageRepository,
    C: CourseRepository,
{
    fn map_chat_error(error: ChatStoreError) -> Error {
        match error {
            ChatStoreError::Connection { message } => {
                Error::service_unavailable(format!("chat store unavailable: {message}"))
            }
            ChatStoreError::Query { message } => {
                Error::internal(format!("chat store error: {message}"))
            }
        }
    }

    fn map_course_error(error: CourseStoreError) -> Error {
        match error {
            CourseStoreError::Connection { message } => {
                Error::service_unavailable(format!("course store unavailable: {message}"))
            }
            CourseStoreError::Query { message } => {
                Error::internal(format!("course store error: {message}"))
            }
        }
    }

    async fn require_course(&self, id: &CourseId) -> Result<Course, Error> {
        self.courses
            .find_by_id(id)
            .await
            .map_err(Self::map_course_error)?
            .ok_or_else(|| Error::not_found("course not found"))
    }
}

#[async_trait]
impl<Ch, C> CourseChat for ChatService<Ch, C>
where
    Ch: ChatMessageRepository,
    C: CourseRepository,
{
    async fn authorise(&self, course_id: &CourseId, caller: &Caller) -> Result<(), Error> {
        let course = self.require_course(course_id).await?;
        if self
            .policy
            .check(caller, Action::AccessCourseChat { course: &course })
            .is_allowed()
        {
            return Ok(());
        }

        let status = self
            .enrollment
            .enrollment_status(&caller.user_id, course_id)
            .await?;
        if status == LookupStatus::Accepted {
            Ok(())
        } else {
            Err(Error::forbidden(
                "an accepted enrollment is required to join this chat",
            ))
        }
    }

    async fn history(
        &self,
        course_id: &CourseId,
        caller: &Caller,
    ) -> Result<Vec<ChatMessage>, Error> {
        self.authorise(course_id, caller).await?;
        self.messages
            .recent_for_course(course_id, CHAT_HISTORY_LIMIT)
            .await
            .map_err(Self::map_chat_error)
    }

    async fn post(&self, command: PostMessageCommand) -> Result<ChatMessage, Error> {
        self.authorise(&command.course_id, &command.caller).await?;
        let message = ChatMessage::new(
            command.course_id,
            command.caller.user_id.clone(),
            command.body,
            Utc::now(),
        );
        self.messages
            .insert(&message)
            .await
            .map_err(Self::map_chat_error)?;
        Ok(message)
    }
}
