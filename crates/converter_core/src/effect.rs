use crate::{AttemptId, SelectedFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SignOut,
    Notify(Notification),
    StartTimers { attempt: AttemptId },
    Convert {
        attempt: AttemptId,
        files: Vec<SelectedFile>,
    },
    /// Attempt completed; its timers must not tick again.
    StopTimers { attempt: AttemptId },
    /// View torn down mid-flight. Stops the timers only; the request keeps running.
    CancelTimers { attempt: AttemptId },
    Download { file_name: String, content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
