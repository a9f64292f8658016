//! Service assembly: wiring persistence adapters into the domain services.

pub mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use crate::domain::ports::{Accounts, CourseChat, EnrollmentWorkflow};
use crate::domain::{
    AccessPolicy, AccountService, CatalogService, ChatService, EnrollmentService, PaymentService,
    QuizService, RolePolicy,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::{ChatHub, WsState};
use crate::outbound::persistence::{
    DbPool, DieselChatRepository, DieselCourseRepository, DieselEnrollmentRepository,
    DieselMembershipStore, DieselPaymentRepository, DieselQuizRepository, DieselUserDirectory,
};

/// Wire every domain service over PostgreSQL adapters sharing one pool.
///
/// The HTTP and WebSocket adapters share the chat service instance so room
/// access decisions and persistence behave identically on both transports.
pub fn build_state(pool: &DbPool) -> (HttpState, WsState) {
    let users = Arc::new(DieselUserDirectory::new(pool.clone()));
    let memberships = Arc::new(DieselMembershipStore::new(pool.clone()));
    let courses = Arc::new(DieselCourseRepository::new(pool.clone()));
    let enrollments = Arc::new(DieselEnrollmentRepository::new(pool.clone()));
    let quizzes = Arc::new(DieselQuizRepository::new(pool.clone()));
    let chat_messages = Arc::new(DieselChatRepository::new(pool.clone()));
    let payments = Arc::new(DieselPaymentRepository::new(pool.clone()));
    let policy: Arc<dyn AccessPolicy> = Arc::new(RolePolicy);

    let workflow: Arc<dyn EnrollmentWorkflow> = Arc::new(EnrollmentService::new(
        enrollments,
        memberships,
        Arc::clone(&users),
        Arc::clone(&courses),
        Arc::clone(&policy),
    ));
    let accounts: Arc<dyn Accounts> = Arc::new(AccountService::new(Arc::clone(&users)));
    let chat: Arc<dyn CourseChat> = Arc::new(ChatService::new(
        chat_messages,
        Arc::clone(&courses),
        Arc::clone(&workflow),
        Arc::clone(&policy),
    ));

    let http_state = HttpState {
        accounts: Arc::clone(&accounts),
        enrollments: Arc::clone(&workflow),
        catalog: Arc::new(CatalogService::new(
            Arc::clone(&courses),
            Arc::clone(&users),
            Arc::clone(&policy),
        )),
        quizzes: Arc::new(QuizService::new(
            quizzes,
            Arc::clone(&courses),
            Arc::clone(&workflow),
            Arc::clone(&policy),
        )),
        chat: Arc::clone(&chat),
        payments: Arc::new(PaymentService::new(
            payments,
            Arc::clone(&courses),
            Arc::clone(&users),
            Arc::clone(&policy),
        )),
    };
    let ws_state = WsState::new(accounts, chat, ChatHub::new());

    (http_state, ws_state)
}
