//! Course catalog domain service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use pagination::Paginated;

use crate::domain::policy::{AccessPolicy, Action, Caller};
use crate::domain::ports::{
    AddLessonCommand, CatalogQuery, CourseCatalog, CourseRepository, CourseStoreError,
    CreateCourseCommand, DirectoryError, UpdateCourseCommand, UserDirectory,
};
use crate::domain::{Course, CourseId, Error, Lesson, Role, UserId};

/// Catalog service implementing the [`CourseCatalog`] driving port.
#[derive(Clone)]
pub struct CatalogService<C, U> {
    courses: Arc<C>,
    users: Arc<U>,
    policy: Arc<dyn AccessPolicy>,
}

impl<C, U> CatalogService<C, U> {
    /// Create a new service with the given stores and policy.
    pub fn new(courses: Arc<C>, users: Arc<U>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            courses,
            users,
            policy,
        }
    }
}

impl<C, U> CatalogService<C, U>
where
    C: CourseRepository,
    U: UserDirectory,
{
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

    async fn require_owned_course(
        &self,
        id: &CourseId,
        caller: &Caller,
        message: &str,
    ) -> Result<Course, Error> {
        let course = self.require_course(id).await?;
        if self
            .policy
            .check(caller, Action::EditCourse { course: &course })
            .is_allowed()
        {
            Ok(course)
        } else {
            Err(Error::forbidden(message.to_owned()))
        }
    }
}

#[async_trait]
impl<C, U> CourseCatalog for CatalogService<C, U>
where
    C: CourseRepository,
    U: UserDirectory,
{
    async fn list(&self, query: CatalogQuery) -> Result<Paginated<Course>, Error> {
        let (items, total) = self
            .courses
            .list(&query.filter, query.page)
            .await
            .map_err(Self::map_course_error)?;
        Ok(Paginated::new(items, query.page, total))
    }

    async fn get(&self, id: &CourseId) -> Result<Course, Error> {
        self.require_course(id).await
    }

    async fn create(&self, command: CreateCourseCommand) -> Result<Course, Error> {
        if !self
            .policy
            .check(&command.caller, Action::CreateCourse)
            .is_allowed()
        {
            return Err(Error::forbidden("only teachers may create courses"));
        }

        let course = Course::new(
            CourseId::random(),
            command.title,
            command.description,
            command.category,
            command.caller.user_id.clone(),
            command.price_cents,
            Utc::now(),
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.courses
            .insert(&course)
            .await
            .map_err(Self::map_course_error)?;
        Ok(course)
    }

    async fn update(&self, command: UpdateCourseCommand) -> Result<Course, Error> {
        let mut course = self
            .require_owned_course(
                &command.course_id,
                &command.caller,
                "not authorised to update this course",
            )
            .await?;

        if let Some(title) = command.title {
            course.title = title;
        }
        if let Some(description) = command.description {
            course.description = description;
        }
        if let Some(category) = command.category {
            course.category = category;
        }
        if let Some(price_cents) = command.price_cents {
            if price_cents < 0 {
                return Err(Error::invalid_request("course price must not be negative"));
            }
            course.price_cents = price_cents;
        }

        let existed = self
            .courses
            .update(&course)
            .await
            .map_err(Self::map_course_error)?;
        if !existed {
            return Err(Error::not_found("course not found"));
        }
        Ok(course)
    }

    async fn delete(&self, id: &CourseId, caller: &Caller) -> Result<(), Error> {
        self.require_owned_course(id, caller, "not authorised to delete this course")
            .await?;
        self.courses
            .delete(id)
            .await
            .map_err(Self::map_course_error)?;
        Ok(())
    }

    async fn add_lesson(&self, command: AddLessonCommand) -> Result<Lesson, Error> {
        let mut course = self
            .require_owned_course(
                &command.course_id,
                &command.caller,
                "not authorised to update this course",
            )
            .await?;

        let lesson = course
            .append_lesson(command.lesson)
            .map_err(|err| Error::invalid_request(err.to_string()))?
            .clone();

        let existed = self
            .courses
            .update(&course)
            .await
            .map_err(Self::map_course_error)?;
        if !existed {
            return Err(Error::not_found("course not found"));
        }
        Ok(lesson)
    }

    async fn list_for_teacher(
        &self,
        teacher_id: &UserId,
        caller: &Caller,
    ) -> Result<Vec<Course>, Error> {
        if !self
            .policy
            .check(caller, Action::ViewTeacherDashboard { teacher_id })
            .is_allowed()
        {
            return Err(Error::forbidden("not authorised to access these courses"));
        }

        let teacher = self
            .users
            .find_by_id(teacher_id)
            .await
            .map_err(Self::map_directory_error)?
            .ok_or_else(|| Error::not_found("teacher not found"))?;
        if teacher.role() != Role::Teacher {
            return Err(Error::not_found("teacher not found"));
        }

        self.courses
            .list_by_instructor(teacher_id)
            .await
            .map_err(Self::map_course_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CourseFilter;
    use crate::domain::{CourseTitle, DisplayName, EmailAddress, RolePolicy, User};
    use crate::test_support::{InMemoryCourses, InMemoryUsers};
    use pagination::PageRequest;
    use rstest::rstest;

    fn service(
        courses: &Arc<InMemoryCourses>,
        users: &Arc<InMemoryUsers>,
    ) -> CatalogService<InMemoryCourses, InMemoryUsers> {
        CatalogService::new(Arc::clone(courses), Arc::clone(users), Arc::new(RolePolicy))
    }

    fn teacher() -> User {
        User::new(
            UserId::random(),
            DisplayName::new("Charles Babbage").expect("valid name"),
            EmailAddress::new("charles@example.com").expect("valid email"),
            Role::Teacher,
        )
    }

    fn create_command(caller: &User, title: &str) -> CreateCourseCommand {
        CreateCourseCommand {
            title: CourseTitle::new(title).expect("valid title"),
            description: "Ownership from first principles".into(),
            category: "programming".into(),
            price_cents: 4_900,
            caller: Caller::from_user(caller),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_assigns_caller_as_instructor() {
        let courses = Arc::new(InMemoryCourses::new());
        let users = Arc::new(InMemoryUsers::new());
        let teacher = teacher();
        users.insert(teacher.clone());

        let course = service(&courses, &users)
            .create(create_command(&teacher, "Introduction to Rust"))
            .await
            .expect("course created");
        assert_eq!(course.instructor_id, *teacher.id());
        assert!(
            courses
                .find_by_id(&course.id)
                .await
                .expect("store readable")
                .is_some()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn students_may_not_create_courses() {
        let courses = Arc::new(InMemoryCourses::new());
        let users = Arc::new(InMemoryUsers::new());
        let student = User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            Role::Student,
        );
        users.insert(student.clone());

        let error = service(&courses, &users)
            .create(create_command(&student, "Nope"))
            .await
            .expect_err("students rejected");
        assert_eq!(error.code(), crate::domain::ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn update_patches_only_supplied_fields() {
        let courses = Arc::new(InMemoryCourses::new());
        let users = Arc::new(InMemoryUsers::new());
        let teacher = teacher();
        users.insert(teacher.clone());
        let svc = service(&courses, &users);
        let course = svc
            .create(create_command(&teacher, "Introduction to Rust"))
            .await
            .expect("course created");

        let updated = svc
            .update(UpdateCourseCommand {
                course_id: course.id.clone(),
                title: None,
                description: Some("Now with async".into()),
                category: None,
                price_cents: None,
                caller: Caller::from_user(&teacher),
            })
            .await
            .expect("course updated");
        assert_eq!(updated.title.as_ref(), "Introduction to Rust");
        assert_eq!(updated.description, "Now with async");
        assert_eq!(updated.price_cents, 4_900);
    }

    #[rstest]
    #[tokio::test]
    async fn lessons_append_in_order() {
        let courses = Arc::new(InMemoryCourses::new());
        let users = Arc::new(InMemoryUsers::new());
        let teacher = teacher();
        users.insert(teacher.clone());
        let svc = service(&courses, &users);
        let course = svc
            .create(create_command(&teacher, "Introduction to Rust"))
            .await
            .expect("course created");

        for expected in 1..=2u32 {
            let lesson = svc
                .add_lesson(AddLessonCommand {
                    course_id: course.id.clone(),
                    lesson: Lesson {
                        title: format!("Lesson {expected}"),
                        description: String::new(),
                        video_url: String::new(),
                        duration_minutes: 20,
                        order: 0,
                    },
                    caller: Caller::from_user(&teacher),
                })
                .await
                .expect("lesson appended");
            assert_eq!(lesson.order, expected);
        }
        let stored = svc.get(&course.id).await.expect("course readable");
        assert_eq!(stored.lessons.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn listing_searches_title_and_description() {
        let courses = Arc::new(InMemoryCourses::new());
        let users = Arc::new(InMemoryUsers::new());
        let teacher = teacher();
        users.insert(teacher.clone());
        let svc = service(&courses, &users);
        svc.create(create_command(&teacher, "Introduction to Rust"))
            .await
            .expect("course created");
        svc.create(create_command(&teacher, "Watercolour Painting"))
            .await
            .expect("course created");

        let page = svc
            .list(CatalogQuery {
                filter: CourseFilter {
                    search: Some("rust".into()),
                    category: None,
                },
                page: PageRequest::default(),
            })
            .await
            .expect("listing succeeds");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title.as_ref(), "Introduction to Rust");
    }
}
