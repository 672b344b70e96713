use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: Level,
    pub message: String,
}

/// User-visible notification queue. Every toast is also logged.
#[derive(Clone, Default)]
pub struct Notifications {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(Level::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    fn push(&self, level: Level, message: String) {
        match level {
            Level::Success | Level::Info => info!("[toast] {}", message),
            Level::Warning => warn!("[toast] {}", message),
            Level::Error => error!("[toast] {}", message),
        }
        // A poisoned queue only loses toasts
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(Toast { level, message });
        }
    }

    /// Take every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .map(|mut toasts| std::mem::take(&mut *toasts))
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts.lock().ok().and_then(|toasts| toasts.last().cloned())
    }
}
