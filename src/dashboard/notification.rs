use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Outcome reported to the operator after a resolve action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    ResolveSucceeded,
    ResolveFailed,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResolveSucceeded => write!(f, "incident.resolved"),
            Self::ResolveFailed => write!(f, "incident.resolve_failed"),
        }
    }
}

/// Transient notification published by the dashboard controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    pub kind: NotificationKind,
    pub incident_id: i32,
    /// Human readable message
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn resolved(incident_id: i32) -> Self {
        Self::new(
            NotificationKind::ResolveSucceeded,
            incident_id,
            format!("Incident {} resolved", incident_id),
        )
    }

    pub fn resolve_failed(incident_id: i32, reason: impl Display) -> Self {
        Self::new(
            NotificationKind::ResolveFailed,
            incident_id,
            format!("Failed to resolve incident {}: {}", incident_id, reason),
        )
    }

    fn new(kind: NotificationKind, incident_id: i32, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            incident_id,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind == NotificationKind::ResolveFailed
    }
}
