//! Quiz authoring and grading domain service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::policy::{AccessPolicy, Action, Caller};
use crate::domain::ports::{
    CourseRepository, CourseStoreError, CreateQuizCommand, EnrollmentWorkflow, QuizDesk,
    QuizRepository, QuizStoreError, SubmitAttemptCommand,
};
use crate::domain::{Course, CourseId, Error, LookupStatus, Quiz, QuizAttempt};

/// Quiz service implementing the [`QuizDesk`] driving port.
///
/// Attempt submission consumes the enrollment workflow's status query: only
/// students holding an `accepted` enrollment may attempt a course's quizzes,
/// which also triggers the workflow's lazy legacy migration for them.
#[derive(Clone)]
pub struct QuizService<Q, C> {
    quizzes: Arc<Q>,
    courses: Arc<C>,
    enrollment: Arc<dyn EnrollmentWorkflow>,
    policy: Arc<dyn AccessPolicy>,
}

impl<Q, C> QuizService<Q, C> {
    /// Create a new service with the given stores and collaborators.
    pub fn new(
        quizzes: Arc<Q>,
        courses: Arc<C>,
        enrollment: Arc<dyn EnrollmentWorkflow>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            quizzes,
            courses,
            enrollment,
            policy,
        }
    }
}

impl<Q, C> QuizService<Q, C>
where
    Q: QuizRepository,
    C: CourseRepository,
{
    fn map_quiz_error(error: QuizStoreError) -> Error {
        match error {
            QuizStoreError::Connection { message } => {
                Error::service_unavailable(format!("quiz store unavailable: {message}"))
            }
            QuizStoreError::Query { message } => {
                Error::internal(format!("quiz store error: {message}"))
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

    async fn require_quiz(&self, id: &Uuid) -> Result<Quiz, Error> {
        self.quizzes
            .find_by_id(id)
            .await
            .map_err(Self::map_quiz_error)?
            .ok_or_else(|| Error::not_found("quiz not found"))
    }
}

#[async_trait]
impl<Q, C> QuizDesk for QuizService<Q, C>
where
    Q: QuizRepository,
    C: CourseRepository,
{
    async fn create(&self, command: CreateQuizCommand) -> Result<Quiz, Error> {
        let course = self.require_course(&command.course_id).await?;
        if !self
            .policy
            .check(&command.caller, Action::EditCourse { course: &course })
            .is_allowed()
        {
            return Err(Error::forbidden("not authorised to author quizzes here"));
        }

        let quiz = Quiz::new(
            Uuid::new_v4(),
            command.course_id,
            command.title,
            command.questions,
            Utc::now(),
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.quizzes
            .insert(&quiz)
            .await
            .map_err(Self::map_quiz_error)?;
        Ok(quiz)
    }

    async fn list_for_course(&self, course_id: &CourseId) -> Result<Vec<Quiz>, Error> {
        self.require_course(course_id).await?;
        self.quizzes
            .list_for_course(course_id)
            .await
            .map_err(Self::map_quiz_error)
    }

    async fn submit_attempt(&self, command: SubmitAttemptCommand) -> Result<QuizAttempt, Error> {
        let quiz = self.require_quiz(&command.quiz_id).await?;

        let status = self
            .enrollment
            .enrollment_status(&command.caller.user_id, &quiz.course_id)
            .await?;
        if status != LookupStatus::Accepted {
            return Err(Error::forbidden(
                "an accepted enrollment is required to attempt this quiz",
            ));
        }

        let attempt = QuizAttempt::submit(
            &quiz,
            command.caller.user_id.clone(),
            command.answers,
            Utc::now(),
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.quizzes
            .insert_attempt(&attempt)
            .await
            .map_err(Self::map_quiz_error)?;
        Ok(attempt)
    }

    async fn list_attempts(
        &self,
        quiz_id: &Uuid,
        caller: &Caller,
    ) -> Result<Vec<QuizAttempt>, Error> {
        let quiz = self.require_quiz(quiz_id).await?;
        let course = self.require_course(&quiz.course_id).await?;
        if !self
            .policy
            .check(caller, Action::ViewCourseAttempts { course: &course })
            .is_allowed()
        {
            return Err(Error::forbidden("not authorised to view these attempts"));
        }

        self.quizzes
            .list_attempts(quiz_id)
            .await
            .map_err(Self::map_quiz_error)
    }
}
