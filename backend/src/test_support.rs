//! In-memory implementations of the driven ports.
//!
//! Enabled through the `test-support` feature so unit and integration tests
//! can exercise the full service and HTTP stack without a database. The
//! enrollment store enforces the same pair-uniqueness guarantee as the
//! PostgreSQL schema, under a single lock, so concurrency properties hold.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{
    ChatMessageRepository, ChatStoreError, CourseFilter, CourseRepository, CourseStoreError,
    DirectoryError, EnrollmentRepository, EnrollmentStoreError, MembershipEntry, MembershipStore,
    MembershipStoreError, PaymentRepository, PaymentStoreError, QuizRepository, QuizStoreError,
    UserDirectory,
};
use crate::domain::ports::EnrollmentWorkflow;
use crate::domain::{
    AccessPolicy, AccountService, CatalogService, ChatMessage, ChatService, Course, CourseId,
    EmailAddress, EnrollmentRecord, EnrollmentService, EnrollmentStatus, PaymentRecord,
    PaymentService, Quiz, QuizAttempt, QuizService, Role, RolePolicy, User, UserId,
};
use crate::inbound::http::state::HttpState;
use pagination::PageRequest;

/// In-memory user directory doubling as the legacy membership store.
///
/// Both ports read the same user records, mirroring the production layout
/// where the membership list is a column on the users table.
#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<BTreeMap<Uuid, User>>,
    fail_membership_writes: AtomicBool,
}

impl InMemoryUsers {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record.
    pub fn insert(&self, user: User) {
        let mut users = self.users.lock().expect("users store poisoned");
        users.insert(*user.id().as_uuid(), user);
    }

    /// Make subsequent membership mutations fail, for dual-write tests.
    pub fn fail_membership_writes(&self, fail: bool) {
        self.fail_membership_writes.store(fail, Ordering::SeqCst);
    }

    /// Current membership list of a student, for assertions.
    pub fn membership_of(&self, student_id: &UserId) -> Vec<CourseId> {
        let users = self.users.lock().expect("users store poisoned");
        users
            .get(student_id.as_uuid())
            .map(|user| user.enrolled_course_ids().to_vec())
            .unwrap_or_default()
    }

    fn mutate_membership(
        &self,
        student_id: &UserId,
        mutate: impl FnOnce(Vec<CourseId>) -> Vec<CourseId>,
    ) -> Result<(), MembershipStoreError> {
        if self.fail_membership_writes.load(Ordering::SeqCst) {
            return Err(MembershipStoreError::query("simulated membership failure"));
        }
        let mut users = self.users.lock().expect("users store poisoned");
        if let Some(user) = users.get(student_id.as_uuid()).cloned() {
            let updated = mutate(user.enrolled_course_ids().to_vec());
            users.insert(
                *student_id.as_uuid(),
                user.with_enrolled_courses(updated),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DirectoryError> {
        let users = self.users.lock().expect("users store poisoned");
        Ok(users.get(id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, DirectoryError> {
        let users = self.users.lock().expect("users store poisoned");
        Ok(users.values().find(|user| user.email() == email).cloned())
    }
}

#[async_trait]
impl MembershipStore for InMemoryUsers {
    async fn contains(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, MembershipStoreError> {
        let users = self.users.lock().expect("users store poisoned");
        Ok(users
            .get(student_id.as_uuid())
            .is_some_and(|user| user.enrolled_course_ids().contains(course_id)))
    }

    async fn add(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(), MembershipStoreError> {
        self.mutate_membership(student_id, |mut courses| {
            if !courses.contains(course_id) {
                courses.push(course_id.clone());
            }
            courses
        })
    }

    async fn remove(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<(), MembershipStoreError> {
        self.mutate_membership(student_id, |courses| {
            courses.into_iter().filter(|id| id != course_id).collect()
        })
    }

    async fn entries_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<MembershipEntry>, MembershipStoreError> {
        let users = self.users.lock().expect("users store poisoned");
        let mut entries = Vec::new();
        for user in users.values() {
            if user.role() != Role::Student {
                continue;
            }
            for course_id in user.enrolled_course_ids() {
                if course_ids.contains(course_id) {
                    entries.push(MembershipEntry {
                        student_id: user.id().clone(),
                        course_id: course_id.clone(),
                    });
                }
            }
        }
        Ok(entries)
    }
}

/// In-memory enrollment record store enforcing pair uniqueness.
#[derive(Default)]
pub struct InMemoryEnrollments {
    records: Mutex<HashMap<(Uuid, Uuid), EnrollmentRecord>>,
}

impl InMemoryEnrollments {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records, for idempotence assertions.
    pub fn len(&self) -> usize {
        self.records.lock().expect("enrollment store poisoned").len()
    }

    /// True when no records are persisted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(student_id: &UserId, course_id: &CourseId) -> (Uuid, Uuid) {
        (*student_id.as_uuid(), *course_id.as_uuid())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollments {
    async fn find(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentStoreError> {
        let records = self.records.lock().expect("enrollment store poisoned");
        Ok(records.get(&Self::key(student_id, course_id)).cloned())
    }

    async fn insert(&self, record: &EnrollmentRecord) -> Result<(), EnrollmentStoreError> {
        let mut records = self.records.lock().expect("enrollment store poisoned");
        let key = Self::key(&record.student_id, &record.course_id);
        if records.contains_key(&key) {
            return Err(EnrollmentStoreError::duplicate_pair(
                record.student_id.to_string(),
                record.course_id.to_string(),
            ));
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn set_status(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
        status: EnrollmentStatus,
    ) -> Result<bool, EnrollmentStoreError> {
        let mut records = self.records.lock().expect("enrollment store poisoned");
        match records.get_mut(&Self::key(student_id, course_id)) {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, EnrollmentStoreError> {
        let mut records = self.records.lock().expect("enrollment store poisoned");
        Ok(records.remove(&Self::key(student_id, course_id)).is_some())
    }

    async fn list_for_courses(
        &self,
        course_ids: &[CourseId],
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentStoreError> {
        let records = self.records.lock().expect("enrollment store poisoned");
        let mut matching: Vec<EnrollmentRecord> = records
            .values()
            .filter(|record| course_ids.contains(&record.course_id))
            .filter(|record| status.is_none_or(|wanted| record.status == wanted))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.composite_id().to_string().cmp(&b.composite_id().to_string()))
        });
        Ok(matching)
    }
}

/// In-memory course store.
#[derive(Default)]
pub struct InMemoryCourses {
    courses: Mutex<BTreeMap<Uuid, Course>>,
}

impl InMemoryCourses {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a course, for fixtures.
    pub fn put(&self, course: Course) {
        let mut courses = self.courses.lock().expect("course store poisoned");
        courses.insert(*course.id.as_uuid(), course);
    }
}

fn matches_filter(course: &Course, filter: &CourseFilter) -> bool {
    if let Some(needle) = &filter.search {
        let needle = needle.to_lowercase();
        let haystack_title = course.title.as_ref().to_lowercase();
        let haystack_description = course.description.to_lowercase();
        if !haystack_title.contains(&needle) && !haystack_description.contains(&needle) {
            return false;
        }
    }
    if let Some(category) = &filter.category {
        if course.category != *category {
            return false;
        }
    }
    true
}

#[async_trait]
impl CourseRepository for InMemoryCourses {
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseStoreError> {
        let courses = self.courses.lock().expect("course store poisoned");
        Ok(courses.get(id.as_uuid()).cloned())
    }

    async fn list(
        &self,
        filter: &CourseFilter,
        page: PageRequest,
    ) -> Result<(Vec<Course>, u64), CourseStoreError> {
        let courses = self.courses.lock().expect("course store poisoned");
        let mut matching: Vec<Course> = courses
            .values()
            .filter(|course| matches_filter(course, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset().unsigned_abs() as usize)
            .take(page.limit().unsigned_abs() as usize)
            .collect();
        Ok((items, total))
    }

    async fn list_by_instructor(
        &self,
        instructor_id: &UserId,
    ) -> Result<Vec<Course>, CourseStoreError> {
        let courses = self.courses.lock().expect("course store poisoned");
        let mut owned: Vec<Course> = courses
            .values()
            .filter(|course| course.instructor_id == *instructor_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn insert(&self, course: &Course) -> Result<(), CourseStoreError> {
        let mut courses = self.courses.lock().expect("course store poisoned");
        courses.insert(*course.id.as_uuid(), course.clone());
        Ok(())
    }

    async fn update(&self, course: &Course) -> Result<bool, CourseStoreError> {
        let mut courses = self.courses.lock().expect("course store poisoned");
        if courses.contains_key(course.id.as_uuid()) {
            courses.insert(*course.id.as_uuid(), course.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete(&self, id: &CourseId) -> Result<bool, CourseStoreError> {
        let mut courses = self.courses.lock().expect("course store poisoned");
        Ok(courses.remove(id.as_uuid()).is_some())
    }
}

/// In-memory quiz and attempt store.
#[derive(Default)]
pub struct InMemoryQuizzes {
    quizzes: Mutex<HashMap<Uuid, Quiz>>,
    attempts: Mutex<Vec<QuizAttempt>>,
}

impl InMemoryQuizzes {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizzes {
    async fn insert(&self, quiz: &Quiz) -> Result<(), QuizStoreError> {
        let mut quizzes = self.quizzes.lock().expect("quiz store poisoned");
        quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Quiz>, QuizStoreError> {
        let quizzes = self.quizzes.lock().expect("quiz store poisoned");
        Ok(quizzes.get(id).cloned())
    }

    async fn list_for_course(&self, course_id: &CourseId) -> Result<Vec<Quiz>, QuizStoreError> {
        let quizzes = self.quizzes.lock().expect("quiz store poisoned");
        let mut matching: Vec<Quiz> = quizzes
            .values()
            .filter(|quiz| quiz.course_id == *course_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<(), QuizStoreError> {
        let mut attempts = self.attempts.lock().expect("quiz store poisoned");
        attempts.push(attempt.clone());
        Ok(())
    }

    async fn list_attempts(&self, quiz_id: &Uuid) -> Result<Vec<QuizAttempt>, QuizStoreError> {
        let attempts = self.attempts.lock().expect("quiz store poisoned");
        let mut matching: Vec<QuizAttempt> = attempts
            .iter()
            .filter(|attempt| attempt.quiz_id == *quiz_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(matching)
    }
}

/// In-memory chat message store.
#[derive(Default)]
pub struct InMemoryChatMessages {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatMessages {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatMessageRepository for InMemoryChatMessages {
    async fn insert(&self, message: &ChatMessage) -> Result<(), ChatStoreError> {
        let mut messages = self.messages.lock().expect("chat store poisoned");
        messages.push(message.clone());
        Ok(())
    }

    async fn recent_for_course(
        &self,
        course_id: &CourseId,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ChatStoreError> {
        let messages = self.messages.lock().expect("chat store poisoned");
        let mut matching: Vec<ChatMessage> = messages
            .iter()
            .filter(|message| message.course_id == *course_id)
            .cloned()
            .collect();
        // Stable ascending sort, then keep the newest tail so ties preserve
        // insertion order.
        matching.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        let keep = limit.unsigned_abs() as usize;
        if matching.len() > keep {
            matching.drain(..matching.len() - keep);
        }
        Ok(matching)
    }
}

/// In-memory payment store.
#[derive(Default)]
pub struct InMemoryPayments {
    payments: Mutex<Vec<PaymentRecord>>,
}

impl InMemoryPayments {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPayments {
    async fn insert(&self, payment: &PaymentRecord) -> Result<(), PaymentStoreError> {
        let mut payments = self.payments.lock().expect("payment store poisoned");
        payments.push(payment.clone());
        Ok(())
    }

    async fn list_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<PaymentRecord>, PaymentStoreError> {
        let payments = self.payments.lock().expect("payment store poisoned");
        let mut matching: Vec<PaymentRecord> = payments
            .iter()
            .filter(|payment| payment.course_id == *course_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(matching)
    }
}

/// Fully wired in-memory platform for HTTP-level tests.
///
/// Holds the raw stores alongside the assembled [`HttpState`] so tests can
/// seed fixtures and assert on persistence effects while driving the real
/// handler stack.
pub struct Platform {
    /// User directory and legacy membership store.
    pub users: Arc<InMemoryUsers>,
    /// Course store.
    pub courses: Arc<InMemoryCourses>,
    /// Enrollment record store.
    pub enrollments: Arc<InMemoryEnrollments>,
    /// Chat message store.
    pub chat_messages: Arc<InMemoryChatMessages>,
    /// Quiz store.
    pub quizzes: Arc<InMemoryQuizzes>,
    /// Payment store.
    pub payments: Arc<InMemoryPayments>,
    /// The enrollment workflow engine, for direct seeding.
    pub workflow: Arc<dyn EnrollmentWorkflow>,
    /// Handler dependency bundle over the stores above.
    pub state: HttpState,
}

/// Wire every service over fresh in-memory stores.
pub fn platform() -> Platform {
    let users = Arc::new(InMemoryUsers::new());
    let courses = Arc::new(InMemoryCourses::new());
    let enrollments = Arc::new(InMemoryEnrollments::new());
    let chat_messages = Arc::new(InMemoryChatMessages::new());
    let quizzes = Arc::new(InMemoryQuizzes::new());
    let payments = Arc::new(InMemoryPayments::new());
    let policy: Arc<dyn AccessPolicy> = Arc::new(RolePolicy);

    let workflow: Arc<dyn EnrollmentWorkflow> = Arc::new(EnrollmentService::new(
        Arc::clone(&enrollments),
        Arc::clone(&users),
        Arc::clone(&users),
        Arc::clone(&courses),
        Arc::clone(&policy),
    ));
    let state = HttpState {
        accounts: Arc::new(AccountService::new(Arc::clone(&users))),
        enrollments: Arc::clone(&workflow),
        catalog: Arc::new(CatalogService::new(
            Arc::clone(&courses),
            Arc::clone(&users),
            Arc::clone(&policy),
        )),
        quizzes: Arc::new(QuizService::new(
            Arc::clone(&quizzes),
            Arc::clone(&courses),
            Arc::clone(&workflow),
            Arc::clone(&policy),
        )),
        chat: Arc::new(ChatService::new(
            Arc::clone(&chat_messages),
            Arc::clone(&courses),
            Arc::clone(&workflow),
            Arc::clone(&policy),
        )),
        payments: Arc::new(PaymentService::new(
            Arc::clone(&payments),
            Arc::clone(&courses),
            Arc::clone(&users),
            Arc::clone(&policy),
        )),
    };

    Platform {
        users,
        courses,
        enrollments,
        chat_messages,
        quizzes,
        payments,
        workflow,
        state,
    }
}
