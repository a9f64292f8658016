//! Per-course broadcast hub.
//!
//! Each course room owns one `tokio::sync::broadcast` channel. Connections
//! subscribe on upgrade and every persisted message is published once; the
//! sender's own connection receives it through the same channel, so there is
//! exactly one delivery path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{ChatMessage, CourseId};

/// Buffered messages per room before slow receivers start lagging.
const ROOM_BUFFER: usize = 64;

/// Shared fan-out hub for course chat rooms.
#[derive(Clone, Default)]
pub struct ChatHub {
    rooms: Arc<Mutex<HashMap<Uuid, broadcast::Sender<ChatMessage>>>>,
}

impl ChatHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a course room, creating its channel on first use.
    pub fn subscribe(&self, course_id: &CourseId) -> broadcast::Receiver<ChatMessage> {
        let mut rooms = self.rooms.lock().expect("chat hub poisoned");
        rooms
            .entry(*course_id.as_uuid())
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0)
            .subscribe()
    }

    /// Fan a persisted message out to every open connection in its room.
    ///
    /// A room without subscribers silently drops the message; history reads
    /// backfill late joiners.
    pub fn publish(&self, message: &ChatMessage) {
        let rooms = self.rooms.lock().expect("chat hub poisoned");
        if let Some(sender) = rooms.get(message.course_id.as_uuid()) {
            let _ = sender.send(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageBody, UserId};
    use chrono::Utc;
    use rstest::rstest;

    fn message(course_id: &CourseId, text: &str) -> ChatMessage {
        ChatMessage::new(
            course_id.clone(),
            UserId::random(),
            MessageBody::new(text).expect("valid body"),
            Utc::now(),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_receive_room_messages() {
        let hub = ChatHub::new();
        let course = CourseId::random();
        let mut receiver = hub.subscribe(&course);

        let sent = message(&course, "hello room");
        hub.publish(&sent);

        let received = receiver.recv().await.expect("message delivered");
        assert_eq!(received.body.as_ref(), "hello room");
    }

    #[rstest]
    #[tokio::test]
    async fn rooms_are_isolated() {
        let hub = ChatHub::new();
        let course_a = CourseId::random();
        let course_b = CourseId::random();
        let mut receiver_a = hub.subscribe(&course_a);
        let _receiver_b = hub.subscribe(&course_b);

        hub.publish(&message(&course_b, "other room"));
        hub.publish(&message(&course_a, "this room"));

        let received = receiver_a.recv().await.expect("message delivered");
        assert_eq!(received.body.as_ref(), "this room");
    }

    #[rstest]
    fn publishing_to_an_empty_room_is_a_no_op() {
        let hub = ChatHub::new();
        let course = CourseId::random();
        hub.publish(&message(&course, "into the void"));
    }
}
