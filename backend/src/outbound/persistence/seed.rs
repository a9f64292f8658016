//! Demo data seeding for local development.
//!
//! Inserts a small cast of users and courses with fixed identifiers so
//! reruns are idempotent. One student carries a legacy membership entry with
//! no enrollment record, which exercises the workflow's lazy reconciliation
//! the first time anything asks for her status.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use super::models::{NewCourseRow, NewUserRow};
use super::schema::{courses, users};

/// Errors raised while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The seeding connection could not be established.
    #[error("failed to connect for seeding: {0}")]
    Connection(String),
    /// A seed row failed to insert.
    #[error("failed to write seed data: {0}")]
    Write(String),
}

const TEACHER_ID: &str = "a1e6a7ec-5c12-4bbd-9d7a-111111111111";
const STUDENT_ID: &str = "b2f7b8fd-6d23-4cce-8e8b-222222222222";
const LEGACY_STUDENT_ID: &str = "c3a8c90e-7e34-4ddf-9f9c-333333333333";
const ADMIN_ID: &str = "d4b9da1f-8f45-4ee0-a0ad-444444444444";
const RUST_COURSE_ID: &str = "e5caeb20-9056-4ff1-b1be-555555555555";
const PAINTING_COURSE_ID: &str = "f6dbfc31-a167-4002-c2cf-666666666666";

fn id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|error| panic!("seed uuid {raw} must parse: {error}"))
}

/// Insert the demo cast, skipping rows that already exist.
pub fn seed_demo(database_url: &str) -> Result<(), SeedError> {
    let mut conn = diesel::PgConnection::establish(database_url)
        .map_err(|err| SeedError::Connection(err.to_string()))?;

    let rust_course = id(RUST_COURSE_ID);
    let painting_course = id(PAINTING_COURSE_ID);
    let legacy_membership = [rust_course];

    let user_rows = vec![
        NewUserRow {
            id: id(TEACHER_ID),
            display_name: "Grace Hopper",
            email: "grace.hopper@learnhub.example",
            role: "teacher",
            enrolled_course_ids: &[],
        },
        NewUserRow {
            id: id(STUDENT_ID),
            display_name: "Ada Lovelace",
            email: "ada.lovelace@learnhub.example",
            role: "student",
            enrolled_course_ids: &[],
        },
        // Pre-records-era student: membership only, no enrollment record.
        NewUserRow {
            id: id(LEGACY_STUDENT_ID),
            display_name: "Alan Turing",
            email: "alan.turing@learnhub.example",
            role: "student",
            enrolled_course_ids: &legacy_membership,
        },
        NewUserRow {
            id: id(ADMIN_ID),
            display_name: "Site Admin",
            email: "admin@learnhub.example",
            role: "admin",
            enrolled_course_ids: &[],
        },
    ];

    diesel::insert_into(users::table)
        .values(&user_rows)
        .on_conflict_do_nothing()
        .execute(&mut conn)
        .map_err(|err| SeedError::Write(err.to_string()))?;

    let rust_lessons = serde_json::json!([
        {
            "title": "Ownership",
            "description": "Moves, copies, and drops",
            "videoUrl": "https://media.learnhub.example/rust/01",
            "durationMinutes": 25,
            "order": 1
        },
        {
            "title": "Borrowing",
            "description": "Shared and exclusive references",
            "videoUrl": "https://media.learnhub.example/rust/02",
            "durationMinutes": 30,
            "order": 2
        }
    ]);
    let no_lessons = serde_json::json!([]);

    let course_rows = vec![
        NewCourseRow {
            id: rust_course,
            title: "Introduction to Rust",
            description: "Ownership from first principles",
            category: "programming",
            instructor_id: id(TEACHER_ID),
            price_cents: 4_900,
            lessons: &rust_lessons,
            created_at: Utc::now(),
        },
        NewCourseRow {
            id: painting_course,
            title: "Watercolour Painting",
            description: "Washes, gradients, and light",
            category: "arts",
            instructor_id: id(TEACHER_ID),
            price_cents: 2_500,
            lessons: &no_lessons,
            created_at: Utc::now(),
        },
    ];

    diesel::insert_into(courses::table)
        .values(&course_rows)
        .on_conflict_do_nothing()
        .execute(&mut conn)
        .map_err(|err| SeedError::Write(err.to_string()))?;

    Ok(())
}
