//! The enrollment workflow engine.
//!
//! Orchestrates the record store (source of truth) and the legacy membership
//! store (derived cache kept for older readers). Consistency rules:
//!
//! - The record store enforces pair uniqueness; concurrent writers lose with
//!   a conflict rather than creating duplicates.
//! - Reads repair divergence forward: a membership entry with no record is
//!   trusted as `accepted` and a record is synthesised lazily. A record is
//!   never auto-corrected from the membership side.
//! - Status decisions write the record first; the membership update is a
//!   best-effort reconciliation whose failure is surfaced to the caller as a
//!   partial application.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::policy::{AccessPolicy, Action, Caller};
use crate::domain::ports::{
    CourseRepository, CourseStoreError, CourseSummary, DecideEnrollmentCommand,
    DeleteEnrollmentCommand, DirectoryError, EnrollRequest, EnrollmentDecision,
    EnrollmentRepository, EnrollmentRow, EnrollmentStoreError, EnrollmentWorkflow,
    MembershipStore, MembershipStoreError, StudentSummary, TeacherEnrollmentsQuery,
    UserDirectory,
};
use crate::domain::{
    Course, CourseId, EnrollmentId, EnrollmentRecord, EnrollmentStatus, Error, LookupStatus, Role,
    User, UserId,
};

/// Enrollment workflow service implementing the driving port.
#[derive(Clone)]
pub struct EnrollmentService<E, M, U, C> {
    enrollments: Arc<E>,
    memberships: Arc<M>,
    users: Arc<U>,
    courses: Arc<C>,
    policy: Arc<dyn AccessPolicy>,
}

impl<E, M, U, C> EnrollmentService<E, M, U, C> {
    /// Create a new service with the given stores and policy.
    pub fn new(
        enrollments: Arc<E>,
        memberships: Arc<M>,
        users: Arc<U>,
        courses: Arc<C>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            enrollments,
            memberships,
            users,
            courses,
            policy,
        }
    }
}

impl<E, M, U, C> EnrollmentService<E, M, U, C>
where
    E: EnrollmentRepository,
    M: MembershipStore,
    U: UserDirectory,
    C: CourseRepository,
{
    fn map_enrollment_error(error: EnrollmentStoreError) -> Error {
        match error {
            EnrollmentStoreError::Connection { message } => {
                Error::service_unavailable(format!("enrollment store unavailable: {message}"))
            }
            EnrollmentStoreError::Query { message } => {
                Error::internal(format!("enrollment store error: {message}"))
            }
            EnrollmentStoreError::DuplicatePair { .. } => {
                Error::conflict("an enrollment already exists for this course")
            }
        }
    }

    fn map_membership_error(error: MembershipStoreError) -> Error {
        match error {
            MembershipStoreError::Connection { message } => {
                Error::service_unavailable(format!("membership store unavailable: {message}"))
            }
            MembershipStoreError::Query { message } => {
                Error::internal(format!("membership store error: {message}"))
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

    async fn require_user(&self, id: &UserId, label: &str) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_directory_error)?
            .ok_or_else(|| Error::not_found(format!("{label} not found")))
    }

    async fn require_course(&self, id: &CourseId) -> Result<Course, Error> {
        self.courses
            .find_by_id(id)
            .await
            .map_err(Self::map_course_error)?
            .ok_or_else(|| Error::not_found("course not found"))
    }

    fn authorise(&self, caller: &Caller, action: Action<'_>, message: &str) -> Result<(), Error> {
        if self.policy.check(caller, action).is_allowed() {
            Ok(())
        } else {
            Err(Error::forbidden(message.to_owned()))
        }
    }

    /// Build one merged-view row, skipping pairs whose student has vanished
    /// from the directory.
    async fn row_for(
        &self,
        record: &EnrollmentRecord,
        course: &Course,
    ) -> Result<Option<EnrollmentRow>, Error> {
        let student = self
            .users
            .find_by_id(&record.student_id)
            .await
            .map_err(Self::map_directory_error)?;
        Ok(student.map(|student| EnrollmentRow {
            id: record.composite_id(),
            course: CourseSummary {
                id: course.id.clone(),
                title: course.title.clone(),
            },
            student: StudentSummary::from_user(&student),
            status: record.status,
            created_at: record.created_at,
        }))
    }

    /// Synthesise an `accepted` record for a legacy membership entry.
    ///
    /// Losing the insert race, or discovering that a record already exists
    /// for the pair, both mean the pair is already represented; the entry is
    /// then skipped rather than surfaced as an error.
    async fn synthesise_accepted(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<EnrollmentRecord>, Error> {
        let record =
            EnrollmentRecord::accepted(student_id.clone(), course_id.clone(), Utc::now());
        match self.enrollments.insert(&record).await {
            Ok(()) => Ok(Some(record)),
            Err(EnrollmentStoreError::DuplicatePair { .. }) => Ok(None),
            Err(error) => Err(Self::map_enrollment_error(error)),
        }
    }
}

#[async_trait]
impl<E, M, U, C> EnrollmentWorkflow for EnrollmentService<E, M, U, C>
where
    E: EnrollmentRepository,
    M: MembershipStore,
    U: UserDirectory,
    C: CourseRepository,
{
    async fn request_enrollment(
        &self,
        request: EnrollRequest,
    ) -> Result<EnrollmentRecord, Error> {
        if !request.caller.is_user(&request.student_id) {
            return Err(Error::forbidden(
                "students may only request their own enrollment",
            ));
        }

        self.require_user(&request.student_id, "student").await?;
        self.require_course(&request.course_id).await?;

        if let Some(existing) = self
            .enrollments
            .find(&request.student_id, &request.course_id)
            .await
            .map_err(Self::map_enrollment_error)?
        {
            return Err(
                Error::conflict("an enrollment already exists for this course")
                    .with_details(json!({ "status": existing.status.as_str() })),
            );
        }

        let record = EnrollmentRecord::pending(
            request.student_id.clone(),
            request.course_id.clone(),
            Utc::now(),
        );
        match self.enrollments.insert(&record).await {
            Ok(()) => Ok(record),
            Err(EnrollmentStoreError::DuplicatePair { .. }) => {
                // A concurrent request won the race between our existence
                // check and the insert; report it like any other duplicate.
                let status = self
                    .enrollments
                    .find(&request.student_id, &request.course_id)
                    .await
                    .map_err(Self::map_enrollment_error)?
                    .map(|existing| existing.status.as_str().to_owned());
                let mut conflict =
                    Error::conflict("an enrollment already exists for this course");
                if let Some(status) = status {
                    conflict = conflict.with_details(json!({ "status": status }));
                }
                Err(conflict)
            }
            Err(error) => Err(Self::map_enrollment_error(error)),
        }
    }

    async fn enrollment_status(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<LookupStatus, Error> {
        self.require_user(student_id, "student").await?;
        self.require_course(course_id).await?;

        if let Some(record) = self
            .enrollments
            .find(student_id, course_id)
            .await
            .map_err(Self::map_enrollment_error)?
        {
            return Ok(record.status.into());
        }

        // Legacy signal: a membership entry with no record means the student
        // was accepted before records existed. Migrate it now; the pair
        // uniqueness constraint keeps repeated lookups from duplicating.
        if self
            .memberships
            .contains(student_id, course_id)
            .await
            .map_err(Self::map_membership_error)?
        {
            self.synthesise_accepted(student_id, course_id).await?;
            return Ok(LookupStatus::Accepted);
        }

        Ok(LookupStatus::NotEnrolled)
    }

    async fn list_for_teacher(
        &self,
        query: TeacherEnrollmentsQuery,
    ) -> Result<Vec<EnrollmentRow>, Error> {
        self.authorise(
            &query.caller,
            Action::ViewTeacherDashboard {
                teacher_id: &query.teacher_id,
            },
            "not authorised to access these enrollments",
        )?;

        let teacher = self.require_user(&query.teacher_id, "teacher").await?;
        if teacher.role() != Role::Teacher {
            return Err(Error::not_found("teacher not found"));
        }

        let owned = self
            .courses
            .list_by_instructor(&query.teacher_id)
            .await
            .map_err(Self::map_course_error)?;
        let scope: Vec<Course> = match &query.course_id {
            Some(course_id) => {
                let course = owned
                    .into_iter()
                    .find(|course| course.id == *course_id)
                    .ok_or_else(|| Error::not_found("course not found"))?;
                vec![course]
            }
            None => owned,
        };
        let scope_ids: Vec<CourseId> = scope.iter().map(|course| course.id.clone()).collect();
        let by_id: HashMap<CourseId, &Course> =
            scope.iter().map(|course| (course.id.clone(), course)).collect();

        let records = self
            .enrollments
            .list_for_courses(&scope_ids, query.status)
            .await
            .map_err(Self::map_enrollment_error)?;

        let mut rows = Vec::with_capacity(records.len());
        let mut seen: HashSet<String> = HashSet::new();
        for record in &records {
            let Some(course) = by_id.get(&record.course_id) else {
                continue;
            };
            if let Some(row) = self.row_for(record, course).await? {
                seen.insert(row.id.to_string());
                rows.push(row);
            }
        }

        // Legacy data only ever represents acceptance, so the merge is
        // skipped for pending/rejected filters.
        let merge_legacy = matches!(query.status, None | Some(EnrollmentStatus::Accepted));
        if merge_legacy {
            let entries = self
                .memberships
                .entries_for_courses(&scope_ids)
                .await
                .map_err(Self::map_membership_error)?;
            for entry in entries {
                let composite =
                    EnrollmentId::new(entry.student_id.clone(), entry.course_id.clone())
                        .to_string();
                if seen.contains(&composite) {
                    continue;
                }
                let Some(course) = by_id.get(&entry.course_id) else {
                    continue;
                };
                let Some(record) = self
                    .synthesise_accepted(&entry.student_id, &entry.course_id)
                    .await?
                else {
                    // A record exists after all (raced or filtered out);
                    // the pair is already represented.
                    continue;
                };
                if let Some(row) = self.row_for(&record, course).await? {
                    seen.insert(composite);
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }

    async fn decide(
        &self,
        command: DecideEnrollmentCommand,
    ) -> Result<EnrollmentDecision, Error> {
        if command.status == EnrollmentStatus::Pending {
            return Err(Error::invalid_request(
                "status must be \"accepted\" or \"rejected\"",
            ));
        }

        let student_id = command.id.student_id().clone();
        let course_id = command.id.course_id().clone();

        let course = self.require_course(&course_id).await?;
        self.authorise(
            &command.caller,
            Action::DecideEnrollment { course: &course },
            "not authorised to update this enrollment",
        )?;
        self.require_user(&student_id, "student").await?;

        let updated = self
            .enrollments
            .set_status(&student_id, &course_id, command.status)
            .await
            .map_err(Self::map_enrollment_error)?;
        if !updated {
            return Err(Error::not_found("enrollment not found"));
        }

        // Record first, membership second: the record is the source of truth
        // and the next read re-derives membership if this write fails.
        let membership_result = match command.status {
            EnrollmentStatus::Accepted => self.memberships.add(&student_id, &course_id).await,
            EnrollmentStatus::Rejected => self.memberships.remove(&student_id, &course_id).await,
            EnrollmentStatus::Pending => Ok(()),
        };
        if let Err(store_error) = membership_result {
            error!(
                error = %store_error,
                student_id = %student_id,
                course_id = %course_id,
                status = %command.status,
                "membership update failed after record write"
            );
            return Err(Error::internal(
                "enrollment status was updated but membership reconciliation failed",
            )
            .with_details(json!({
                "partiallyApplied": "record",
                "status": command.status.as_str(),
            })));
        }

        Ok(EnrollmentDecision {
            id: command.id,
            status: command.status,
        })
    }

    async fn delete(&self, command: DeleteEnrollmentCommand) -> Result<(), Error> {
        let student_id = command.id.student_id().clone();
        let course_id = command.id.course_id().clone();

        self.require_user(&student_id, "student").await?;
        let course = self.require_course(&course_id).await?;
        self.authorise(
            &command.caller,
            Action::DecideEnrollment { course: &course },
            "not authorised to delete this enrollment",
        )?;

        let existed = self
            .enrollments
            .delete(&student_id, &course_id)
            .await
            .map_err(Self::map_enrollment_error)?;
        if !existed {
            warn!(
                student_id = %student_id,
                course_id = %course_id,
                "delete requested for absent enrollment record"
            );
        }

        self.memberships
            .remove(&student_id, &course_id)
            .await
            .map_err(Self::map_membership_error)?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
