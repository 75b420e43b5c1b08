//! Lifecycle states of a fetch task inside the dispatcher

use std::fmt;

/// Represents the current state of a fetch task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// URL is in the work queue
    Queued,

    /// Fetch admitted and running
    Running,

    /// Rate limited; the fetch is waiting for another attempt
    Retrying,

    /// Fetch produced a successful result
    Completed,

    /// Fetch produced a failed result
    Failed,
}

impl TaskState {
    /// Returns true if no further transitions follow
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
