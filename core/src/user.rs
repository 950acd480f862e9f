//! Actors: users and their roles.
//!
//! Users are provisioned by an external directory; the core only
//! reads identity and role to authorize transitions.

use serde::{Deserialize, Serialize};

/// User identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Assigns requests to masters and cancels them.
    Dispatcher,
    /// Field worker; starts and finishes assigned work.
    Master,
    /// Creates requests.
    Client,
}

impl Role {
    /// Get the role as its wire/database string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatcher => "dispatcher",
            Self::Master => "master",
            Self::Client => "client",
        }
    }

    /// Parse a role from its wire/database string.
    ///
    /// # Errors
    ///
    /// Returns error if the role string is not recognized.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "dispatcher" => Ok(Self::Dispatcher),
            "master" => Ok(Self::Master),
            "client" => Ok(Self::Client),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory user, read-only with respect to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Actor role.
    pub role: Role,
}

/// The authenticated actor behind a command.
///
/// Identity and role are resolved out-of-band by the session layer;
/// the core treats them as trusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User identifier.
    pub id: UserId,
    /// Actor role.
    pub role: Role,
}
