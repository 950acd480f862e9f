//! Request store trait.
//!
//! Abstraction over the durable state of requests. The contract that
//! makes the engine race-free lives here: every `apply_*` operation
//! is a single atomic conditional write - the precondition is part
//! of the write itself, never a separate read - and reports whether
//! exactly one row changed. Two concurrent writes racing on the same
//! request commit serially in the store; the loser's condition
//! matches zero rows and the operation returns `false`.

use crate::error::Result;
use crate::request::{CreateRequest, Request, RequestFilter, RequestId};
use crate::user::{User, UserId};

/// Durable store of requests and read-only directory data.
///
/// # Implementations
///
/// - `PostgresRequestStore` (in `workorder-postgres`): production
/// - `InMemoryRequestStore` (behind the `test-utils` feature): testing
pub trait RequestStore: Send + Sync {
    /// Find or create a pending request.
    ///
    /// If a request with identical `client_name`, `phone` and
    /// `problem_text` is still `new`, it is returned instead of
    /// inserting a duplicate, making intake safe against caller
    /// retries. Otherwise a new record is inserted with status
    /// `new`, no assignee and version 0. Match and insert happen in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn create(
        &self,
        request: &CreateRequest,
    ) -> impl Future<Output = Result<Request>> + Send;

    /// List requests, optionally narrowed by assignee and/or status.
    ///
    /// Ordering is deterministic: id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn list(
        &self,
        filter: &RequestFilter,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send;

    /// List users with role `master`, id ascending.
    ///
    /// Directory data, exposed here so it can be read in the same
    /// transaction as the dashboard listing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn list_masters(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// List all directory users, id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Dashboard read: requests matching `filter` plus the masters
    /// available for assignment.
    ///
    /// The default implementation issues the two reads back to back;
    /// implementations with transactions should override it so both
    /// come from one consistent snapshot. Staleness relative to
    /// concurrent writes is acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn list_dashboard(
        &self,
        filter: &RequestFilter,
    ) -> impl Future<Output = Result<(Vec<Request>, Vec<User>)>> + Send {
        async move {
            let requests = self.list(filter).await?;
            let masters = self.list_masters().await?;
            Ok((requests, masters))
        }
    }

    /// Guarded write: `new → assigned`, setting the assignee.
    ///
    /// Succeeds only if the request is currently `new`. Returns
    /// whether exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn apply_assign(
        &self,
        id: RequestId,
        master: UserId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Guarded write: `new | assigned → canceled`.
    ///
    /// Returns whether exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn apply_cancel(&self, id: RequestId) -> impl Future<Output = Result<bool>> + Send;

    /// Guarded write: `assigned → in_progress`, bumping `version`.
    ///
    /// Succeeds only if the request is `assigned` to `master` at
    /// write time - the optimistic-lock point. When two starts race,
    /// the store commits one first; the other's condition no longer
    /// matches and the call returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn apply_start(
        &self,
        id: RequestId,
        master: UserId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Guarded write: `in_progress → done`.
    ///
    /// Succeeds only if the request is `in_progress` and assigned to
    /// `master`. Returns whether exactly one row changed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if the store fails.
    fn apply_finish(
        &self,
        id: RequestId,
        master: UserId,
    ) -> impl Future<Output = Result<bool>> + Send;
}
