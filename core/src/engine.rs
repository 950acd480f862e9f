//! Transition engine: role-gated dispatch to guarded store writes.
//!
//! The engine owns the state machine's transition table and nothing
//! else. It checks role and input shape before touching the store,
//! then issues exactly one guarded write and classifies the result.
//! It never pre-reads request state: the precondition travels inside
//! the write, so there is no check-then-act window to lose a race in.

use crate::error::{EngineError, StoreError};
use crate::request::{CreateRequest, Request, RequestFilter, RequestId, Status};
use crate::store::RequestStore;
use crate::user::{Actor, Role, User, UserId};

/// A lifecycle action requested by an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Dispatcher assigns a `new` request to a master.
    Assign,
    /// Dispatcher cancels a `new` or `assigned` request.
    Cancel,
    /// Master starts an `assigned` request of theirs.
    Start,
    /// Master finishes an `in_progress` request of theirs.
    Finish,
}

impl Action {
    /// The role allowed to perform this action.
    #[must_use]
    pub const fn required_role(&self) -> Role {
        match self {
            Self::Assign | Self::Cancel => Role::Dispatcher,
            Self::Start | Self::Finish => Role::Master,
        }
    }

    /// Get the action as its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Cancel => "cancel",
            Self::Start => "start",
            Self::Finish => "finish",
        }
    }

    /// Parse an action from its wire string.
    ///
    /// # Errors
    ///
    /// Returns error if the action string is not recognized.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "assign" => Ok(Self::Assign),
            "cancel" => Ok(Self::Cancel),
            "start" => Ok(Self::Start),
            "finish" => Ok(Self::Finish),
            _ => Err(format!("Unknown action: {s}")),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition command against one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The requested action.
    pub action: Action,
    /// The request to act on.
    pub request_id: RequestId,
    /// Assignment target; required for [`Action::Assign`] only.
    pub target: Option<UserId>,
}

/// Classified result of a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The guarded write changed exactly one row.
    Applied,
    /// The guard matched zero rows: another actor already changed
    /// the state, or the caller's view was stale. Recoverable; the
    /// caller should refresh and decide again.
    Conflict,
    /// The actor's role does not permit the action. No store call
    /// was made.
    Unauthorized,
    /// The command was malformed (bad request id, missing assign
    /// target). No store call was made.
    InvalidInput,
}

impl Outcome {
    /// Whether the transition was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// A role-scoped dashboard view.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Requests visible to the actor, id ascending.
    pub requests: Vec<Request>,
    /// Masters available as assignment targets, id ascending.
    pub masters: Vec<User>,
}

/// Role-gated dispatch from transition commands to guarded store
/// writes.
///
/// Holds no state beyond the store handle; safe to share and clone.
#[derive(Debug, Clone)]
pub struct TransitionEngine<S> {
    store: S,
}

impl<S: RequestStore> TransitionEngine<S> {
    /// Create an engine over a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create a request from intake fields.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidInput`]: an intake field is empty; no
    ///   store call was made
    /// - [`EngineError::Store`]: the backing store failed
    pub async fn create(&self, request: CreateRequest) -> Result<Request, EngineError> {
        if request.client_name.trim().is_empty() {
            return Err(EngineError::InvalidInput("client_name"));
        }
        if request.phone.trim().is_empty() {
            return Err(EngineError::InvalidInput("phone"));
        }
        if request.address.trim().is_empty() {
            return Err(EngineError::InvalidInput("address"));
        }
        if request.problem_text.trim().is_empty() {
            return Err(EngineError::InvalidInput("problem_text"));
        }

        let created = self.store.create(&request).await?;
        tracing::debug!(request_id = %created.id, "request created");
        Ok(created)
    }

    /// Execute a transition on behalf of an actor.
    ///
    /// Role and input checks are pure and happen before any store
    /// interaction; a rejected command never touches the store. The
    /// guarded write's `false` return (zero rows matched the
    /// precondition) maps to [`Outcome::Conflict`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store
    /// fails. A lost race is not an error; it is
    /// [`Outcome::Conflict`].
    pub async fn execute(
        &self,
        actor: Actor,
        transition: Transition,
    ) -> Result<Outcome, StoreError> {
        let Transition {
            action,
            request_id,
            target,
        } = transition;

        if request_id.0 <= 0 {
            tracing::debug!(%action, request_id = %request_id, "rejected: bad request id");
            return Ok(Outcome::InvalidInput);
        }

        if actor.role != action.required_role() {
            tracing::debug!(
                %action,
                actor_id = %actor.id,
                actor_role = %actor.role,
                "rejected: role not permitted"
            );
            return Ok(Outcome::Unauthorized);
        }

        let applied = match action {
            Action::Assign => {
                let Some(master) = target.filter(|m| m.0 > 0) else {
                    tracing::debug!(request_id = %request_id, "rejected: assign without target");
                    return Ok(Outcome::InvalidInput);
                };
                self.store.apply_assign(request_id, master).await?
            }
            Action::Cancel => self.store.apply_cancel(request_id).await?,
            Action::Start => self.store.apply_start(request_id, actor.id).await?,
            Action::Finish => self.store.apply_finish(request_id, actor.id).await?,
        };

        if applied {
            tracing::debug!(%action, request_id = %request_id, actor_id = %actor.id, "applied");
            Ok(Outcome::Applied)
        } else {
            tracing::warn!(
                %action,
                request_id = %request_id,
                actor_id = %actor.id,
                "conflict: precondition matched zero rows"
            );
            Ok(Outcome::Conflict)
        }
    }

    /// Build the dashboard view for an actor.
    ///
    /// Masters see only requests assigned to them; dispatchers and
    /// clients see all requests, optionally narrowed by status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store
    /// fails.
    pub async fn dashboard(
        &self,
        actor: Actor,
        status: Option<Status>,
    ) -> Result<Dashboard, StoreError> {
        let filter = RequestFilter {
            assigned_to: (actor.role == Role::Master).then_some(actor.id),
            status,
        };

        let (requests, masters) = self.store.list_dashboard(&filter).await?;
        Ok(Dashboard { requests, masters })
    }
}
