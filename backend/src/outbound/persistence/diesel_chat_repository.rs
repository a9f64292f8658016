//! PostgreSQL-backed `ChatMessageRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{ChatMessageRepository, ChatStoreError};
use crate::domain::{ChatMessage, CourseId, MessageBody, UserId};

use super::models::{ChatMessageRow, NewChatMessageRow};
use super::pool::{DbPool, PoolError};
use super::schema::chat_messages;

/// Diesel-backed implementation of the `ChatMessageRepository` port.
#[derive(Clone)]
pub struct DieselChatRepository {
    pool: DbPool,
}

impl DieselChatRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain chat store errors.
fn map_pool_error(error: PoolError) -> ChatStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ChatStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain chat store errors.
fn map_diesel_error(error: diesel::result::Error) -> ChatStoreError {
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
        DieselError::NotFound => ChatStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ChatStoreError::connection("database connection error")
        }
        _ => ChatStoreError::query("database error"),
    }
}

/// Convert a database row to a domain chat message.
fn row_to_message(row: ChatMessageRow) -> Result<ChatMessage, ChatStoreError> {
    let body = MessageBody::new(row.body).map_err(|err| {
        ChatStoreError::query(format!("corrupted message body in database: {err}"))
    })?;
    Ok(ChatMessage {
        id: row.id,
        course_id: CourseId::from_uuid(row.course_id),
        sender_id: UserId::from_uuid(row.sender_id),
        body,
        sent_at: row.sent_at,
    })
}

#[async_trait]
impl ChatMessageRepository for DieselChatRepository {
    async fn insert(&self, message: &ChatMessage) -> Result<(), ChatStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewChatMessageRow {
            id: message.id,
            course_id: *message.course_id.as_uuid(),
            sender_id: *message.sender_id.as_uuid(),
            body: message.body.as_ref(),
            sent_at: message.sent_at,
        };

        diesel::insert_into(chat_messages::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn recent_for_course(
        &self,
        course_id: &CourseId,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ChatStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // Newest tail first, then flipped so callers read oldest first.
        let rows: Vec<ChatMessageRow> = chat_messages::table
            .filter(chat_messages::course_id.eq(course_id.as_uuid()))
            .order((chat_messages::sent_at.desc(), chat_messages::id.desc()))
            .limit(limit)
            .select(ChatMessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut messages = rows
            .into_iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}
