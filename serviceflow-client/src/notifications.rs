//! User-visible notifications surfaced by the board session.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    Retry,
    Reconnect,
    Dismiss,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }

    /// A rejected card move; dismissible, never fatal.
    pub fn move_rejected(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message).with_action(NotificationAction::Dismiss)
    }

    /// Initial snapshot load failed; the session blocks on an explicit retry.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message).with_action(NotificationAction::Retry)
    }

    /// The live channel is down and the client is retrying or polling.
    pub fn channel_degraded(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message).with_action(NotificationAction::Reconnect)
    }
}
