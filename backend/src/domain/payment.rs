//! Payment record data model.
//!
//! Payments are recorded, never charged; gateway integration is out of
//! scope, so a record is an amount, a pair of identifiers, and an opaque
//! client-supplied reference.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::course::CourseId;
use super::user::UserId;

/// Maximum length of a payment reference.
pub const PAYMENT_REFERENCE_MAX: usize = 100;

/// Validation errors returned by the payment constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentValidationError {
    NonPositiveAmount,
    EmptyReference,
    ReferenceTooLong { max: usize },
}

impl fmt::Display for PaymentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "payment amount must be positive"),
            Self::EmptyReference => write!(f, "payment reference must not be empty"),
            Self::ReferenceTooLong { max } => {
                write!(f, "payment reference must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for PaymentValidationError {}

/// One recorded payment against a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Stable payment identifier.
    pub id: Uuid,
    /// Paying student.
    #[schema(value_type = String)]
    pub student_id: UserId,
    /// Course paid for.
    #[schema(value_type = String)]
    pub course_id: CourseId,
    /// Amount in integer cents.
    pub amount_cents: i64,
    /// Opaque client-supplied reference (receipt number, transfer id).
    pub reference: String,
    /// Server-side receipt timestamp.
    pub recorded_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Validate and stamp a new payment record.
    pub fn new(
        student_id: UserId,
        course_id: CourseId,
        amount_cents: i64,
        reference: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, PaymentValidationError> {
        if amount_cents <= 0 {
            return Err(PaymentValidationError::NonPositiveAmount);
        }
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(PaymentValidationError::EmptyReference);
        }
        if reference.chars().count() > PAYMENT_REFERENCE_MAX {
            return Err(PaymentValidationError::ReferenceTooLong {
                max: PAYMENT_REFERENCE_MAX,
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            amount_cents,
            reference,
            recorded_at,
        })
    }
}
