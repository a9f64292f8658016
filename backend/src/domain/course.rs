//! Course catalog data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Validation errors returned by the course constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseValidationError {
    EmptyId,
    InvalidId,
    EmptyTitle,
    TitleTooLong { max: usize },
    NegativePrice,
    EmptyLessonTitle,
}

impl fmt::Display for CourseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "course id must not be empty"),
            Self::InvalidId => write!(f, "course id must be a valid UUID"),
            Self::EmptyTitle => write!(f, "course title must not be empty"),
            Self::TitleTooLong { max } => {
                write!(f, "course title must be at most {max} characters")
            }
            Self::NegativePrice => write!(f, "course price must not be negative"),
            Self::EmptyLessonTitle => write!(f, "lesson title must not be empty"),
        }
    }
}

impl std::error::Error for CourseValidationError {}

/// Stable course identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseId(Uuid, String);

impl CourseId {
    /// Validate and construct a [`CourseId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, CourseValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`CourseId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, CourseValidationError> {
        if id.is_empty() {
            return Err(CourseValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(CourseValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| CourseValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for CourseId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CourseId> for String {
    fn from(value: CourseId) -> Self {
        let CourseId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for CourseId {
    type Error = CourseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Maximum allowed length for a course title.
pub const COURSE_TITLE_MAX: usize = 200;

/// Validated course title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseTitle(String);

impl CourseTitle {
    /// Validate and construct a [`CourseTitle`].
    pub fn new(title: impl Into<String>) -> Result<Self, CourseValidationError> {
        Self::from_owned(title.into())
    }

    fn from_owned(title: String) -> Result<Self, CourseValidationError> {
        if title.trim().is_empty() {
            return Err(CourseValidationError::EmptyTitle);
        }
        if title.chars().count() > COURSE_TITLE_MAX {
            return Err(CourseValidationError::TitleTooLong {
                max: COURSE_TITLE_MAX,
            });
        }
        Ok(Self(title))
    }
}

impl AsRef<str> for CourseTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CourseTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CourseTitle> for String {
    fn from(value: CourseTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for CourseTitle {
    type Error = CourseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// One lesson inside a course.
///
/// Lessons live as an ordered document on the course rather than as rows of
/// their own; authoring appends and the `order` field records the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Lesson heading shown in the syllabus.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Link to the hosted lesson video.
    #[serde(default)]
    pub video_url: String,
    /// Expected duration in minutes.
    #[serde(default)]
    pub duration_minutes: u32,
    /// One-based position within the course.
    pub order: u32,
}

impl Lesson {
    /// Validate the parts of a lesson that authoring must not leave blank.
    pub fn validate(&self) -> Result<(), CourseValidationError> {
        if self.title.trim().is_empty() {
            return Err(CourseValidationError::EmptyLessonTitle);
        }
        Ok(())
    }
}

/// Catalog entry for one course.
///
/// ## Invariants
/// - `title` satisfies [`CourseTitle`] validation.
/// - `price_cents` is non-negative.
/// - `instructor_id` names the owning teacher; ownership checks compare
///   against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Stable course identifier.
    #[schema(value_type = String, example = "7c9e6679-7425-40de-944b-e07fc1f90ae7")]
    pub id: CourseId,
    /// Course title shown in the catalog.
    #[schema(value_type = String, example = "Introduction to Rust")]
    pub title: CourseTitle,
    /// Catalog description.
    pub description: String,
    /// Free-form category tag used by catalog filters.
    pub category: String,
    /// Owning teacher.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub instructor_id: UserId,
    /// Price in integer cents; zero means free.
    pub price_cents: i64,
    /// Ordered syllabus.
    pub lessons: Vec<Lesson>,
    /// Creation timestamp; catalog listings sort by it, newest first.
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Build a catalog entry, validating the price.
    pub fn new(
        id: CourseId,
        title: CourseTitle,
        description: impl Into<String>,
        category: impl Into<String>,
        instructor_id: UserId,
        price_cents: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseValidationError> {
        if price_cents < 0 {
            return Err(CourseValidationError::NegativePrice);
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            category: category.into(),
            instructor_id,
            price_cents,
            lessons: Vec::new(),
            created_at,
        })
    }

    /// Replace the syllabus wholesale.
    pub fn with_lessons(mut self, lessons: Vec<Lesson>) -> Self {
        self.lessons = lessons;
        self
    }

    /// Append a lesson, assigning the next position.
    pub fn append_lesson(&mut self, mut lesson: Lesson) -> Result<&Lesson, CourseValidationError> {
        lesson.validate()?;
        let order = self.lessons.len() as u32 + 1;
        lesson.order = order;
        self.lessons.push(lesson);
        // Just pushed, so the list cannot be empty.
        Ok(self.lessons.last().unwrap_or_else(|| unreachable!()))
    }

    /// True when the given user owns this course.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.instructor_id == *user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn course() -> Course {
        Course::new(
            CourseId::random(),
            CourseTitle::new("Introduction to Rust").expect("valid title"),
            "Ownership from first principles",
            "programming",
            UserId::random(),
            4_900,
            Utc::now(),
        )
        .expect("valid course")
    }

    #[rstest]
    #[case("", CourseValidationError::EmptyTitle)]
    #[case("   ", CourseValidationError::EmptyTitle)]
    fn title_rejects_blank_input(#[case] raw: &str, #[case] expected: CourseValidationError) {
        let err = CourseTitle::new(raw).expect_err("blank title rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn title_rejects_oversized_input() {
        let raw = "x".repeat(COURSE_TITLE_MAX + 1);
        let err = CourseTitle::new(raw).expect_err("oversized title rejected");
        assert_eq!(
            err,
            CourseValidationError::TitleTooLong {
                max: COURSE_TITLE_MAX
            }
        );
    }

    #[rstest]
    fn negative_price_is_rejected() {
        let err = Course::new(
            CourseId::random(),
            CourseTitle::new("Free course").expect("valid title"),
            "",
            "",
            UserId::random(),
            -1,
            Utc::now(),
        )
        .expect_err("negative price rejected");
        assert_eq!(err, CourseValidationError::NegativePrice);
    }

    #[rstest]
    fn append_lesson_assigns_sequential_order() {
        let mut course = course();
        for expected_order in 1..=3u32 {
            let lesson = course
                .append_lesson(Lesson {
                    title: format!("Lesson {expected_order}"),
                    description: String::new(),
                    video_url: String::new(),
                    duration_minutes: 30,
                    order: 0,
                })
                .expect("lesson appended");
            assert_eq!(lesson.order, expected_order);
        }
    }

    #[rstest]
    fn append_lesson_rejects_blank_titles() {
        let mut course = course();
        let err = course
            .append_lesson(Lesson {
                title: "  ".into(),
                description: String::new(),
                video_url: String::new(),
                duration_minutes: 0,
                order: 0,
            })
            .expect_err("blank lesson title rejected");
        assert_eq!(err, CourseValidationError::EmptyLessonTitle);
        assert!(course.lessons.is_empty());
    }

    #[rstest]
    fn ownership_compares_instructor_id() {
        let course = course();
        assert!(course.is_owned_by(&course.instructor_id.clone()));
        assert!(!course.is_owned_by(&UserId::random()));
    }
}
