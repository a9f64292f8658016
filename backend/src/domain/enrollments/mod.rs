//! Enrollment workflow domain services.
//!
//! This module implements the driving port for the enrollment workflow: the
//! state machine over (student, course) records and its reconciliation with
//! the legacy membership lists.

mod service;

pub use service::EnrollmentService;
