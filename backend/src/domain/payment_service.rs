//! Payment log domain service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::policy::{AccessPolicy, Action, Caller};
use crate::domain::ports::{
    CourseRepository, CourseStoreError, DirectoryError, PaymentLog, PaymentRepository,
    PaymentStoreError, RecordPaymentCommand, UserDirectory,
};
use crate::domain::{Course, CourseId, Error, PaymentRecord};

/// Payment service implementing the [`PaymentLog`] driving port.
#[derive(Clone)]
pub struct PaymentService<P, C, U> {
    payments: Arc<P>,
    courses: Arc<C>,
    users: Arc<U>,
    policy: Arc<dyn AccessPolicy>,
}

impl<P, C, U> PaymentService<P, C, U> {
    /// Create a new service with the given stores and policy.
    pub fn new(
        payments: Arc<P>,
        courses: Arc<C>,
        users: Arc<U>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            payments,
            courses,
            users,
            policy,
        }
    }
}

impl<P, C, U> PaymentService<P, C, U>
where
    P: PaymentRepository,
    C: CourseRepository,
    U: UserDirectory,
{
    fn map_payment_error(error: PaymentStoreError) -> Error {
        match error {
            PaymentStoreError::Connection { message } => {
                Error::service_unavailable(format!("payment store unavailable: {message}"))
            }
            PaymentStoreError::Query { message } => {
                Error::internal(format!("payment store error: {message}"))
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

    fn map_directory_error(error: DirectoryError) -> Error {
        match error {
            DirectoryError::Connection { message } => {
                Error::service_unavailable(format!("user directory unavailable: {message}"))
            }
            DirectoryError::Query { message } => {
                Error::internal(format!("user directory error: {message}"))
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
impl<P, C, U> PaymentLog for PaymentService<P, C, U>
where
    P: PaymentRepository,
    C: CourseRepository,
    U: UserDirectory,
{
    async fn record(&self, command: RecordPaymentCommand) -> Result<PaymentRecord, Error> {
        if !self
            .policy
            .check(
                &command.caller,
                Action::RecordPayment {
                    student_id: &command.student_id,
                },
            )
            .is_allowed()
        {
            return Err(Error::forbidden(
                "payments may only be recorded by the paying student",
            ));
        }

        self.users
            .find_by_id(&command.student_id)
            .await
            .map_err(Self::map_directory_error)?
            .ok_or_else(|| Error::not_found("student not found"))?;
        self.require_course(&command.course_id).await?;

        let record = PaymentRecord::new(
            command.student_id,
            command.course_id,
            command.amount_cents,
            command.reference,
            Utc::now(),
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.payments
            .insert(&record)
            .await
            .map_err(Self::map_payment_error)?;
        Ok(record)
    }

    async fn list_for_course(
        &self,
        course_id: &CourseId,
        caller: &Caller,
    ) -> Result<Vec<PaymentRecord>, Error> {
        let course = self.require_course(course_id).await?;
        if !self
            .policy
            .check(caller, Action::ViewCoursePayments { course: &course })
            .is_allowed()
        {
            return Err(Error::forbidden("not authorised to view these payments"));
        }

        self.payments
            .list_for_course(course_id)
            .await
            .map_err(Self::map_payment_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CourseTitle, DisplayName, EmailAddress, ErrorCode, Role, RolePolicy, User, UserId,
    };
    use crate::test_support::{InMemoryCourses, InMemoryPayments, InMemoryUsers};
    use rstest::rstest;

    struct Harness {
        users: Arc<InMemoryUsers>,
        courses: Arc<InMemoryCourses>,
        service: PaymentService<InMemoryPayments, InMemoryCourses, InMemoryUsers>,
    }

    fn harness() -> Harness {
        let users = Arc::new(InMemoryUsers::new());
        let courses = Arc::new(InMemoryCourses::new());
        let service = PaymentService::new(
            Arc::new(InMemoryPayments::new()),
            Arc::clone(&courses),
            Arc::clone(&users),
            Arc::new(RolePolicy),
        );
        Harness {
            users,
            courses,
            service,
        }
    }

    fn seed(h: &Harness) -> (User, User, Course) {
        let teacher = User::new(
            UserId::random(),
            DisplayName::new("Charles Babbage").expect("valid name"),
            EmailAddress::new("charles@example.com").expect("valid email"),
            Role::Teacher,
        );
        let student = User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            Role::Student,
        );
        let course = Course::new(
            CourseId::random(),
            CourseTitle::new("Engines").expect("valid title"),
            "",
            "programming",
            teacher.id().clone(),
            4_900,
            Utc::now(),
        )
        .expect("valid course");
        h.users.insert(teacher.clone());
        h.users.insert(student.clone());
        h.courses.put(course.clone());
        (teacher, student, course)
    }

    fn record_command(student: &User, course: &Course) -> RecordPaymentCommand {
        RecordPaymentCommand {
            student_id: student.id().clone(),
            course_id: course.id.clone(),
            amount_cents: 4_900,
            reference: "bank-2025-06-001".into(),
            caller: Caller::from_user(student),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn students_record_payments_owners_list_them() {
        let h = harness();
        let (teacher, student, course) = seed(&h);

        let record = h
            .service
            .record(record_command(&student, &course))
            .await
            .expect("payment recorded");
        assert_eq!(record.amount_cents, 4_900);

        let listed = h
            .service
            .list_for_course(&course.id, &Caller::from_user(&teacher))
            .await
            .expect("owner lists payments");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].reference, "bank-2025-06-001");
    }

    #[rstest]
    #[tokio::test]
    async fn students_may_not_pay_for_others() {
        let h = harness();
        let (_, student, course) = seed(&h);
        let other = User::new(
            UserId::random(),
            DisplayName::new("Grace Hopper").expect("valid name"),
            EmailAddress::new("grace@example.com").expect("valid email"),
            Role::Student,
        );
        h.users.insert(other.clone());

        let mut command = record_command(&student, &course);
        command.caller = Caller::from_user(&other);
        let error = h
            .service
            .record(command)
            .await
            .expect_err("impersonation rejected");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn listing_requires_course_staff() {
        let h = harness();
        let (_, student, course) = seed(&h);

        let error = h
            .service
            .list_for_course(&course.id, &Caller::from_user(&student))
            .await
            .expect_err("students rejected");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }
}
