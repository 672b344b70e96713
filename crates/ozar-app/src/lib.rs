//! Client-side application logic for Ozar Network Labs: session state, route
//! guarding, page controllers with their forms, the chat responder and the
//! scheduled health-check job. Everything talks to storage through
//! [`ozar_gateway::Gateway`].

pub mod chat;
pub mod error;
pub mod forms;
pub mod guard;
pub mod health;
pub mod notify;
pub mod pages;
pub mod session;

#[cfg(test)]
mod testing;

pub use chat::{ChatSession, respond};
pub use error::AppError;
pub use guard::{GuardDecision, Route, guard};
pub use health::HealthJob;
pub use notify::Notifications;
pub use session::{SessionContext, SessionState};
