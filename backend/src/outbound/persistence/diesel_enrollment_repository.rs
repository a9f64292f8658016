//! PostgreSQL-backed `EnrollmentRepository` implementation using Diesel ORM.
//!
//! The enrollments table carries a composite primary key on
//! (student_id, course_id); this adapter maps the resulting unique-violation
//! errors into [`EnrollmentStoreError::DuplicatePair`] so the workflow can
//! distinguish losing an insert race from other failures.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{EnrollmentRepository, EnrollmentStoreError};
use crate::domain::{CourseId, EnrollmentRecord, EnrollmentStatus, UserId};

use super::models::{EnrollmentRow, NewEnrollmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::enrollments;

/// Diesel-backed implementation of the `EnrollmentRepository` port.
#[derive(Clone)]
pub struct DieselEnrollmentRepository {
    pool: DbPool,
}

impl DieselEnrollmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain enrollment store errors.
fn map_pool_error(error: PoolError) -> EnrollmentStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            EnrollmentStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain enrollment store errors.
///
/// Unique violations are reported through the dedicated constructor by the
/// insert path, which knows the pair; here they collapse into a query error
/// because no other statement can legitimately raise one.
fn map_diesel_error(error: diesel::result::Error) -> EnrollmentStoreError {
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
        DieselError::NotFound => EnrollmentStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => EnrollmentStoreError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            EnrollmentStoreError::connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => EnrollmentStoreError::query("database error"),
        _ => EnrollmentStoreError::query("database error"),
    }
}

/// Convert a database row to a domain enrollment record.
fn row_to_record(row: EnrollmentRow) -> Result<EnrollmentRecord, EnrollmentStoreError> {
    let status: EnrollmentStatus = row.status.parse().map_err(|err| {
        EnrollmentStoreError::query(format!("invalid status in database: {err}"))
    })?;
    Ok(EnrollmentRecord {
        student_id: UserId::from_uuid(row.student_id),
        course_id: CourseId::from_uuid(row.course_id),
        status,
        created_at: row.created_at,
    })
}

#[async_trait]
impl EnrollmentRepository for DieselEnrollmentRepository {
    async fn find(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<EnrollmentRow> = enrollments::table
            .filter(
                enrollments::student_id
                    .eq(student_id.as_uuid())
                    .and(enrollments::course_id.eq(course_id.as_uuid())),
            )
            .select(EnrollmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_record).transpose()
    }

    async fn insert(&self, record: &EnrollmentRecord) -> Result<(), EnrollmentStoreError> {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewEnrollmentRow {
            student_id: *record.student_id.as_uuid(),
            course_id: *record.course_id.as_uuid(),
            status: record.status.as_str(),
            created_at: record.created_at,
        };

        match diesel::insert_into(enrollments::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(EnrollmentStoreError::duplicate_pair(
                    record.student_id.to_string(),
                    record.course_id.to_string(),
                ))
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }

    async fn set_status(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
        status: EnrollmentStatus,
    ) -> Result<bool, EnrollmentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            enrollments::table.filter(
                enrollments::student_id
                    .eq(student_id.as_uuid())
                    .and(enrollments::course_id.eq(course_id.as_uuid())),
            ),
        )
        .set(enrollments::status.eq(status.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, EnrollmentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            enrollments::table.filter(
                enrollments::student_id
                    .eq(student_id.as_uuid())
                    .and(enrollments::course_id.eq(course_id.as_uuid())),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn list_for_courses(
        &self,
        course_ids: &[CourseId],
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let course_uuids: Vec<uuid::Uuid> =
            course_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<EnrollmentRow> = match status {
            Some(status) => {
                enrollments::table
                    .filter(enrollments::course_id.eq_any(&course_uuids))
                    .filter(enrollments::status.eq(status.as_str()))
                    .order(enrollments::created_at.desc())
                    .select(EnrollmentRow::as_select())
                    .load(&mut conn)
                    .await
            }
            None => {
                enrollments::table
                    .filter(enrollments::course_id.eq_any(&course_uuids))
                    .order(enrollments::created_at.desc())
                    .select(EnrollmentRow::as_select())
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let pool_err = PoolError::checkout("connection refused");
        let repo_err = map_pool_error(pool_err);

        assert!(matches!(repo_err, EnrollmentStoreError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let diesel_err = diesel::result::Error::NotFound;
        let repo_err = map_diesel_error(diesel_err);

        assert!(matches!(repo_err, EnrollmentStoreError::Query { .. }));
        assert!(repo_err.to_string().contains("record not found"));
    }

    #[rstest]
    fn corrupted_status_is_a_query_error() {
        let row = EnrollmentRow {
            student_id: uuid::Uuid::new_v4(),
            course_id: uuid::Uuid::new_v4(),
            status: "cancelled".into(),
            created_at: chrono::Utc::now(),
        };
        let err = row_to_record(row).expect_err("unknown status rejected");
        assert!(matches!(err, EnrollmentStoreError::Query { .. }));
    }

    #[rstest]
    fn valid_rows_convert_to_records() {
        let row = EnrollmentRow {
            student_id: uuid::Uuid::new_v4(),
            course_id: uuid::Uuid::new_v4(),
            status: "pending".into(),
            created_at: chrono::Utc::now(),
        };
        let record = row_to_record(row).expect("valid row converts");
        assert_eq!(record.status, EnrollmentStatus::Pending);
    }
}
