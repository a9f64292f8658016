//! PostgreSQL-backed `UserDirectory` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{DirectoryError, UserDirectory};
use crate::domain::{CourseId, DisplayName, EmailAddress, Role, User, UserId};

use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserDirectory` port.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain directory errors.
fn map_pool_error(error: PoolError) -> DirectoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            DirectoryError::connection(message)
        }
    }
}

/// Map Diesel errors to domain directory errors.
fn map_diesel_error(error: diesel::result::Error) -> DirectoryError {
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
        DieselError::NotFound => DirectoryError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DirectoryError::connection("database connection error")
        }
        _ => DirectoryError::query("database error"),
    }
}

/// Convert a database row to a domain user.
pub(crate) fn row_to_user(row: UserRow) -> Result<User, DirectoryError> {
    let display_name = DisplayName::new(row.display_name).map_err(|err| {
        DirectoryError::query(format!("corrupted display name in database: {err}"))
    })?;
    let email = EmailAddress::new(row.email)
        .map_err(|err| DirectoryError::query(format!("corrupted email in database: {err}")))?;
    let role: Role = row
        .role
        .parse()
        .map_err(|err| DirectoryError::query(format!("invalid role in database: {err}")))?;
    let enrolled = row
        .enrolled_course_ids
        .into_iter()
        .map(CourseId::from_uuid)
        .collect();

    Ok(
        User::new(UserId::from_uuid(row.id), display_name, email, role)
            .with_enrolled_courses(enrolled),
    )
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, DirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }
}
