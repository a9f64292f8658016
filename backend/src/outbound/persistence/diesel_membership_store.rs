//! PostgreSQL-backed `MembershipStore` implementation using Diesel ORM.
//!
//! The legacy membership list lives as a `uuid[]` column on the users table.
//! Mutations are read-modify-write on that single column, matching the
//! original representation; the enrollment record store remains the source
//! of truth, so a lost update here is repaired by the next workflow read.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{MembershipEntry, MembershipStore, MembershipStoreError};
use crate::domain::{CourseId, Role, UserId};

use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `MembershipStore` port.
#[derive(Clone)]
pub struct DieselMembershipStore {
    pool: DbPool,
}

impl DieselMembershipStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_list(
        &self,
        student_id: &UserId,
    ) -> Result<Option<Vec<Uuid>>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::id.eq(student_id.as_uuid()))
            .select(users::enrolled_course_ids)
            .first::<Vec<Uuid>>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn store_list(
        &self,
        student_id: &UserId,
        list: Vec<Uuid>,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.filter(users::id.eq(student_id.as_uuid())))
            .set(users::enrolled_course_ids.eq(list))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

/// Map pool errors to domain membership store errors.
fn map_pool_error(error: PoolError) -> MembershipStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            MembershipStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain membership store errors.
fn map_diesel_error(error: diesel::result::Error) -> MembershipStoreError {
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
        DieselError::NotFound => MembershipStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            MembershipStoreError::connection("database connection error")
        }
        _ => MembershipStoreError::query("database error"),
    }
}

#[async_trait]
impl MembershipStore for DieselMembershipStore {
    async fn contains(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, MembershipStoreError> {
        let list = self.load_list(student_id).await?;
        Ok(list.is_some_and(|courses| courses.contains(course_id.as_uuid())))
    }

    async fn add(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(), MembershipStoreError> {
        let Some(mut list) = self.load_list(student_id).await? else {
            return Ok(());
        };
        if list.contains(course_id.as_uuid()) {
            return Ok(());
        }
        list.push(*course_id.as_uuid());
        self.store_list(student_id, list).await
    }

    async fn remove(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(), MembershipStoreError> {
        let Some(list) = self.load_list(student_id).await? else {
            return Ok(());
        };
        if !list.contains(course_id.as_uuid()) {
            return Ok(());
        }
        let filtered: Vec<Uuid> = list
            .into_iter()
            .filter(|id| id != course_id.as_uuid())
            .collect();
        self.store_list(student_id, filtered).await
    }

    async fn entries_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<MembershipEntry>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let course_uuids: Vec<Uuid> = course_ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<(Uuid, Vec<Uuid>)> = users::table
            .filter(users::role.eq(Role::Student.as_str()))
            .filter(users::enrolled_course_ids.overlaps_with(&course_uuids))
            .order(users::id.asc())
            .select((users::id, users::enrolled_course_ids))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut entries = Vec::new();
        for (student_id, list) in rows {
            for course_uuid in list {
                if course_uuids.contains(&course_uuid) {
                    entries.push(MembershipEntry {
                        student_id: UserId::from_uuid(student_id),
                        course_id: CourseId::from_uuid(course_uuid),
                    });
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(repo_err, MembershipStoreError::Connection { .. }));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let repo_err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(repo_err, MembershipStoreError::Query { .. }));
    }
}
