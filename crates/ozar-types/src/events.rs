use serde::{Deserialize, Serialize};

use crate::models::Session;

/// Kind of auth transition reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    UserUpdated,
}

/// Notification delivered to every auth-change subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}
