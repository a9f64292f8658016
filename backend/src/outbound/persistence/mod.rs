//! PostgreSQL persistence adapters.
//!
//! One Diesel-backed adapter per driven port, a shared async connection
//! pool, and the embedded migrations the server applies at startup.

pub mod models;
pub mod pool;
pub mod schema;
pub mod seed;

mod diesel_chat_repository;
mod diesel_course_repository;
mod diesel_enrollment_repository;
mod diesel_membership_store;
mod diesel_payment_repository;
mod diesel_quiz_repository;
mod diesel_user_directory;

pub use diesel_chat_repository::DieselChatRepository;
pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_enrollment_repository::DieselEnrollmentRepository;
pub use diesel_membership_store::DieselMembershipStore;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_quiz_repository::DieselQuizRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use pool::{DbPool, PoolConfig, PoolError};
pub use seed::{SeedError, seed_demo};

use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Errors raised while applying schema migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The migration connection could not be established.
    #[error("failed to connect for migrations: {0}")]
    Connection(String),
    /// A migration failed to apply.
    #[error("failed to apply migrations: {0}")]
    Apply(String),
}

/// Apply any pending migrations over a dedicated synchronous connection.
///
/// Runs once at startup, before the async pool is built, so the pool never
/// observes a partially migrated schema.
pub fn run_migrations(database_url: &str) -> Result<(), MigrationError> {
    let mut conn = diesel::PgConnection::establish(database_url)
        .map_err(|err| MigrationError::Connection(err.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply(err.to_string()))?;
    Ok(())
}
