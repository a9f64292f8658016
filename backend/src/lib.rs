//! Learning-platform backend.
//!
//! REST + WebSocket service for course catalog management, the enrollment
//! approval workflow, quiz authoring and grading, per-course chat, and
//! payment recording. The enrollment workflow is the heart of the system:
//! it keeps the canonical per-(student, course) status records consistent
//! with the legacy per-student membership lists older clients still read.
//!
//! Layout follows the hexagon: `domain` holds entities, ports, and services;
//! `inbound` adapts HTTP and WebSocket traffic onto driving ports; and
//! `outbound` implements the driven ports over PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
