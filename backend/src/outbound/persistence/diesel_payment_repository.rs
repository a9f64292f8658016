//! PostgreSQL-backed `PaymentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{PaymentRepository, PaymentStoreError};
use crate::domain::{CourseId, PaymentRecord, UserId};

use super::models::{NewPaymentRow, PaymentRow};
use super::pool::{DbPool, PoolError};
use super::schema::payments;

/// Diesel-backed implementation of the `PaymentRepository` port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain payment store errors.
fn map_pool_error(error: PoolError) -> PaymentStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PaymentStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain payment store errors.
fn map_diesel_error(error: diesel::result::Error) -> PaymentStoreError {
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
        DieselError::NotFound => PaymentStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PaymentStoreError::connection("database connection error")
        }
        _ => PaymentStoreError::query("database error"),
    }
}

fn row_to_payment(row: PaymentRow) -> PaymentRecord {
    PaymentRecord {
        id: row.id,
        student_id: UserId::from_uuid(row.student_id),
        course_id: CourseId::from_uuid(row.course_id),
        amount_cents: row.amount_cents,
        reference: row.reference,
        recorded_at: row.recorded_at,
    }
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn insert(&self, payment: &PaymentRecord) -> Result<(), PaymentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewPaymentRow {
            id: payment.id,
            student_id: *payment.student_id.as_uuid(),
            course_id: *payment.course_id.as_uuid(),
            amount_cents: payment.amount_cents,
            reference: &payment.reference,
            recorded_at: payment.recorded_at,
        };

        diesel::insert_into(payments::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<PaymentRecord>, PaymentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::course_id.eq(course_id.as_uuid()))
            .order(payments::recorded_at.desc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_payment).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rows_convert_to_payment_records() {
        let id = uuid::Uuid::new_v4();
        let row = PaymentRow {
            id,
            student_id: uuid::Uuid::new_v4(),
            course_id: uuid::Uuid::new_v4(),
            amount_cents: 4_900,
            reference: "bank-2025-06-001".into(),
            recorded_at: chrono::Utc::now(),
        };
        let record = row_to_payment(row);
        assert_eq!(record.id, id);
        assert_eq!(record.amount_cents, 4_900);
    }
}
