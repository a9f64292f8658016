//! Shared WebSocket adapter state.
//!
//! WebSocket entry points depend on domain ports (use-cases) instead of
//! constructing domain services directly. This makes the adapter testable
//! with deterministic test doubles and keeps side effects out of the
//! connection loop.

use std::sync::Arc;

use crate::domain::ports::{Accounts, CourseChat};

use super::hub::ChatHub;

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    /// Session identity resolution.
    pub accounts: Arc<dyn Accounts>,
    /// Chat access checks and message persistence.
    pub chat: Arc<dyn CourseChat>,
    /// Fan-out hub shared by every connection.
    pub hub: ChatHub,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(accounts: Arc<dyn Accounts>, chat: Arc<dyn CourseChat>, hub: ChatHub) -> Self {
        Self {
            accounts,
            chat,
            hub,
        }
    }
}
