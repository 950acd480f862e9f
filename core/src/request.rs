//! Request record and lifecycle status.

use crate::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request identifier, assigned by the store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub i64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a request.
///
/// Transitions form a directed acyclic path
/// `new → assigned → in_progress → done`, with `canceled` reachable
/// from `new` or `assigned` only. `done` and `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Created by intake, not yet assigned.
    New,
    /// Assigned to a master by a dispatcher.
    Assigned,
    /// Work started by the assigned master.
    InProgress,
    /// Canceled by a dispatcher before work started.
    Canceled,
    /// Work finished by the assigned master.
    Done,
}

impl Status {
    /// Get the status as its wire/database string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Canceled => "canceled",
            Self::Done => "done",
        }
    }

    /// Parse a status from its wire/database string.
    ///
    /// # Errors
    ///
    /// Returns error if the status string is not one of the five
    /// known values.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "new" => Ok(Self::New),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "canceled" => Ok(Self::Canceled),
            "done" => Ok(Self::Done),
            _ => Err(format!("Unknown request status: {s}")),
        }
    }

    /// Whether no further transition is valid from this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Done)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repair-service request tracked through the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Stable identifier, immutable after creation.
    pub id: RequestId,

    /// Client name from intake, immutable after creation.
    pub client_name: String,

    /// Contact phone from intake, immutable after creation.
    pub phone: String,

    /// Service address from intake, immutable after creation.
    pub address: String,

    /// Problem description from intake, immutable after creation.
    pub problem_text: String,

    /// Current lifecycle status.
    pub status: Status,

    /// Master responsible for the request.
    ///
    /// `None` while `new`; set on assignment and never cleared, so
    /// assignment history survives cancellation and completion.
    pub assigned_to: Option<UserId>,

    /// Optimistic-lock fence for the start transition.
    ///
    /// Incremented exactly once per successful `in_progress`
    /// transition; two masters racing to start the same job can bump
    /// it at most once.
    pub version: i64,

    /// When the request was created.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful transition.
    pub updated_at: DateTime<Utc>,
}

/// Intake command: the free-form fields of a new request.
///
/// All four fields must be non-empty; the engine rejects incomplete
/// intake before touching the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Client name.
    pub client_name: String,
    /// Contact phone.
    pub phone: String,
    /// Service address.
    pub address: String,
    /// Problem description.
    pub problem_text: String,
}

/// Narrowing applied to a dashboard listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Only requests assigned to this master.
    pub assigned_to: Option<UserId>,
    /// Only requests currently in this status.
    pub status: Option<Status>,
}
