//! PostgreSQL-backed `CourseRepository` implementation using Diesel ORM.
//!
//! Lessons are stored as one jsonb document per course, preserving the
//! original on-course syllabus representation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use pagination::PageRequest;

use crate::domain::ports::{CourseFilter, CourseRepository, CourseStoreError};
use crate::domain::{Course, CourseId, CourseTitle, Lesson, UserId};

use super::models::{CourseRow, CourseUpdate, NewCourseRow};
use super::pool::{DbPool, PoolError};
use super::schema::courses;

/// Diesel-backed implementation of the `CourseRepository` port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain course store errors.
fn map_pool_error(error: PoolError) -> CourseStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CourseStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain course store errors.
fn map_diesel_error(error: diesel::result::Error) -> CourseStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => CourseStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CourseStoreError::connection("database connection error")
        }
        _ => CourseStoreError::query("database error"),
    }
}

/// Convert a database row to a domain course.
fn row_to_course(row: CourseRow) -> Result<Course, CourseStoreError> {
    let title = CourseTitle::new(row.title)
        .map_err(|err| CourseStoreError::query(format!("corrupted title in database: {err}")))?;
    let lessons: Vec<Lesson> = serde_json::from_value(row.lessons).map_err(|err| {
        CourseStoreError::query(format!("corrupted lessons document in database: {err}"))
    })?;

    Course::new(
        CourseId::from_uuid(row.id),
        title,
        row.description,
        row.category,
        UserId::from_uuid(row.instructor_id),
        row.price_cents,
        row.created_at,
    )
    .map(|course| course.with_lessons(lessons))
    .map_err(|err| CourseStoreError::query(format!("corrupted course in database: {err}")))
}

fn lessons_document(course: &Course) -> Result<serde_json::Value, CourseStoreError> {
    serde_json::to_value(&course.lessons).map_err(|err| {
        CourseStoreError::query(format!("failed to serialise lessons document: {err}"))
    })
}

/// ILIKE pattern for the optional search needle; `%` matches everything.
fn search_pattern(filter: &CourseFilter) -> String {
    filter
        .search
        .as_ref()
        .map_or_else(|| "%".to_owned(), |needle| format!("%{needle}%"))
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CourseRow> = courses::table
            .filter(courses::id.eq(id.as_uuid()))
            .select(CourseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_course).transpose()
    }

    async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Course>, u64), CourseStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = search_pattern(filter);

        let (rows, total): (Vec<CourseRow>, i64) = match &filter.category {
            Some(category) => {
                let total = courses::table
                    .filter(
                        courses::title
                            .ilike(pattern.clone())
                            .or(courses::description.ilike(pattern.clone())),
                    )
                    .filter(courses::category.eq(category))
                    .count()
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let rows = courses::table
                    .filter(
                        courses::title
                            .ilike(pattern.clone())
                            .or(courses::description.ilike(pattern)),
                    )
                    .filter(courses::category.eq(category))
                    .order(courses::created_at.desc())
                    .offset(page.offset())
                    .limit(page.limit())
                    .select(CourseRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                (rows, total)
            }
            None => {
                let total = courses::table
                    .filter(
                        courses::title
                            .ilike(pattern.clone())
                            .or(courses::description.ilike(pattern.clone())),
                    )
                    .count()
                    .get_result(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                let rows = courses::table
                    .filter(
                        courses::title
                            .ilike(pattern.clone())
                            .or(courses::description.ilike(pattern)),
                    )
                    .order(courses::created_at.desc())
                    .offset(page.offset())
                    .limit(page.limit())
                    .select(CourseRow::as_select())
                    .load(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                (rows, total)
            }
        };

        let items = rows
            .into_iter()
            .map(row_to_course)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((items, total.unsigned_abs()))
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> Result<Vec<Course>, CourseStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CourseRow> = courses::table
            .filter(courses::instructor_id.eq(instructor_id.as_uuid()))
            .order(courses::created_at.desc())
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_course).collect()
    }

    async fn insert(&self, course: &Course) -> Result<(), CourseStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lessons = lessons_document(course)?;

        let new_row = NewCourseRow {
            id: *course.id.as_uuid(),
            title: course.title.as_ref(),
            description: &course.description,
            category: &course.category,
            instructor_id: *course.instructor_id.as_uuid(),
            price_cents: course.price_cents,
            lessons: &lessons,
            created_at: course.created_at,
        };

        diesel::insert_into(courses::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, course: &Course) -> Result<bool, CourseStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lessons = lessons_document(course)?;

        let update = CourseUpdate {
            title: course.title.as_ref(),
            description: &course.description,
            category: &course.category,
            price_cents: course.price_cents,
            lessons: &lessons,
        };

        let updated = diesel::update(courses::table.filter(courses::id.eq(course.id.as_uuid())))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete(&self, id: &CourseId) -> Result<bool, CourseStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(courses::table.filter(courses::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
