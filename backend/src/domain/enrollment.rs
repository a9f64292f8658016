//! Enrollment record and status types: the data model of the workflow core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::course::CourseId;
use super::user::UserId;

/// Persisted state of one enrollment record.
///
/// The record moves between these states only through the explicit
/// status-transition operation; no state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Requested by the student, awaiting a teacher decision.
    Pending,
    /// Approved; the student is a member of the course.
    Accepted,
    /// Declined; the student is not a member of the course.
    Rejected,
}

impl EnrollmentStatus {
    /// Stable string form used in storage and wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown enrollment status: {value}")]
pub struct UnknownStatus {
    /// The rejected input.
    pub value: String,
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a status lookup.
///
/// `NotEnrolled` is a valid terminal answer for a pair with no record and no
/// legacy membership; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// An enrollment record exists with `pending` status.
    Pending,
    /// An enrollment record exists (or was just synthesised) with `accepted`
    /// status.
    Accepted,
    /// An enrollment record exists with `rejected` status.
    Rejected,
    /// No record and no legacy membership entry.
    NotEnrolled,
}

impl From<EnrollmentStatus> for LookupStatus {
    fn from(value: EnrollmentStatus) -> Self {
        match value {
            EnrollmentStatus::Pending => Self::Pending,
            EnrollmentStatus::Accepted => Self::Accepted,
            EnrollmentStatus::Rejected => Self::Rejected,
        }
    }
}

impl LookupStatus {
    /// Stable string form used in wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::NotEnrolled => "not_enrolled",
        }
    }
}

impl fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical per-(student, course) status entry.
///
/// ## Invariants
/// - At most one record exists per (student, course) pair; the store enforces
///   this with a uniqueness constraint.
/// - `created_at` is set once at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    /// The enrolling student.
    pub student_id: UserId,
    /// The target course.
    pub course_id: CourseId,
    /// Current workflow state.
    pub status: EnrollmentStatus,
    /// Creation timestamp, immutable after insert.
    pub created_at: DateTime<Utc>,
}

impl EnrollmentRecord {
    /// A fresh `pending` record for a student's enrollment request.
    pub fn pending(student_id: UserId, course_id: CourseId, created_at: DateTime<Utc>) -> Self {
        Self {
            student_id,
            course_id,
            status: EnrollmentStatus::Pending,
            created_at,
        }
    }

    /// An `accepted` record synthesised from legacy membership data.
    pub fn accepted(student_id: UserId, course_id: CourseId, created_at: DateTime<Utc>) -> Self {
        Self {
            student_id,
            course_id,
            status: EnrollmentStatus::Accepted,
            created_at,
        }
    }

    /// The composite identifier for this record's pair.
    pub fn composite_id(&self) -> EnrollmentId {
        EnrollmentId::new(self.student_id.clone(), self.course_id.clone())
    }
}

/// Separator between the two halves of a composite enrollment identifier.
const SEPARATOR: char = '_';

/// Parse errors for [`EnrollmentId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentIdError {
    /// The separator was missing, so one half is absent.
    #[error("enrollment id must take the form <studentId>_<courseId>")]
    MissingSeparator,
    /// The student half did not parse as a UUID.
    #[error("enrollment id has a malformed student id")]
    InvalidStudentId,
    /// The course half did not parse as a UUID.
    #[error("enrollment id has a malformed course id")]
    InvalidCourseId,
}

/// Synthetic composite identifier for a (student, course) pair.
///
/// The merged enrollment view has no single backing record id, so rows are
/// addressed by `studentId_courseId`. Both halves are UUIDs, which never
/// contain the separator, so the split is unambiguous. Always go through
/// [`EnrollmentId::parse`] and [`fmt::Display`] rather than splitting raw
/// strings.
///
/// # Examples
/// ```
/// use backend::domain::EnrollmentId;
///
/// let raw = "3fa85f64-5717-4562-b3fc-2c963f66afa6_7c9e6679-7425-40de-944b-e07fc1f90ae7";
/// let id = EnrollmentId::parse(raw).expect("well-formed id");
/// assert_eq!(id.to_string(), raw);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnrollmentId {
    student_id: UserId,
    course_id: CourseId,
}

impl EnrollmentId {
    /// Pair two validated identifiers.
    pub fn new(student_id: UserId, course_id: CourseId) -> Self {
        Self {
            student_id,
            course_id,
        }
    }

    /// Parse the `studentId_courseId` form.
    pub fn parse(raw: &str) -> Result<Self, EnrollmentIdError> {
        let Some((student, course)) = raw.split_once(SEPARATOR) else {
            return Err(EnrollmentIdError::MissingSeparator);
        };
        if student.is_empty() || course.is_empty() {
            return Err(EnrollmentIdError::MissingSeparator);
        }
        let student_id =
            UserId::new(student).map_err(|_| EnrollmentIdError::InvalidStudentId)?;
        let course_id = CourseId::new(course).map_err(|_| EnrollmentIdError::InvalidCourseId)?;
        Ok(Self {
            student_id,
            course_id,
        })
    }

    /// The student half.
    pub fn student_id(&self) -> &UserId {
        &self.student_id
    }

    /// The course half.
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    /// Consume into the two halves.
    pub fn into_parts(self) -> (UserId, CourseId) {
        (self.student_id, self.course_id)
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.student_id, self.course_id)
    }
}

impl std::str::FromStr for EnrollmentId {
    type Err = EnrollmentIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl From<EnrollmentId> for String {
    fn from(value: EnrollmentId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EnrollmentId {
    type Error = EnrollmentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const STUDENT: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const COURSE: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    #[rstest]
    #[case("pending", EnrollmentStatus::Pending)]
    #[case("accepted", EnrollmentStatus::Accepted)]
    #[case("rejected", EnrollmentStatus::Rejected)]
    fn status_parses_stable_strings(#[case] raw: &str, #[case] expected: EnrollmentStatus) {
        let status: EnrollmentStatus = raw.parse().expect("known status");
        assert_eq!(status, expected);
        assert_eq!(status.as_str(), raw);
    }

    #[rstest]
    fn status_rejects_unknown_strings() {
        let err = "cancelled"
            .parse::<EnrollmentStatus>()
            .expect_err("unknown status");
        assert_eq!(err.value, "cancelled");
    }

    #[rstest]
    fn lookup_status_has_not_enrolled_sentinel() {
        assert_eq!(LookupStatus::NotEnrolled.as_str(), "not_enrolled");
        assert_eq!(
            serde_json::to_value(LookupStatus::NotEnrolled).expect("serialises"),
            serde_json::Value::String("not_enrolled".into())
        );
    }

    #[rstest]
    fn composite_id_round_trips() {
        let raw = format!("{STUDENT}_{COURSE}");
        let id = EnrollmentId::parse(&raw).expect("well-formed id");
        assert_eq!(id.student_id().to_string(), STUDENT);
        assert_eq!(id.course_id().to_string(), COURSE);
        assert_eq!(id.to_string(), raw);
    }

    #[rstest]
    #[case("bogus", EnrollmentIdError::MissingSeparator)]
    #[case("", EnrollmentIdError::MissingSeparator)]
    #[case("_abc", EnrollmentIdError::MissingSeparator)]
    #[case("abc_", EnrollmentIdError::MissingSeparator)]
    #[case("not-a-uuid_7c9e6679-7425-40de-944b-e07fc1f90ae7", EnrollmentIdError::InvalidStudentId)]
    #[case("3fa85f64-5717-4562-b3fc-2c963f66afa6_not-a-uuid", EnrollmentIdError::InvalidCourseId)]
    fn composite_id_rejects_malformed_input(
        #[case] raw: &str,
        #[case] expected: EnrollmentIdError,
    ) {
        let err = EnrollmentId::parse(raw).expect_err("malformed id rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn record_constructors_set_status() {
        let student = UserId::new(STUDENT).expect("valid id");
        let course = CourseId::new(COURSE).expect("valid id");
        let now = Utc::now();

        let pending = EnrollmentRecord::pending(student.clone(), course.clone(), now);
        assert_eq!(pending.status, EnrollmentStatus::Pending);

        let accepted = EnrollmentRecord::accepted(student, course, now);
        assert_eq!(accepted.status, EnrollmentStatus::Accepted);
        assert_eq!(
            accepted.composite_id().to_string(),
            format!("{STUDENT}_{COURSE}")
        );
    }
}
