//! In-memory request store for testing.
//!
//! Preserves the production atomicity contract: every guarded write
//! performs its check and mutation under a single mutex acquisition,
//! so concurrent transitions observe the same winner-takes-all
//! behavior as the `PostgreSQL` store.

use crate::error::{Result, StoreError};
use crate::request::{CreateRequest, Request, RequestFilter, RequestId, Status};
use crate::store::RequestStore;
use crate::user::{Role, User, UserId};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    requests: BTreeMap<i64, Request>,
    users: BTreeMap<i64, User>,
    next_id: i64,
}

/// In-memory request store.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRequestStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRequestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory user (masters become assignment targets).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is
    /// poisoned.
    pub fn add_user(&self, user: User) -> Result<()> {
        let mut inner = self.lock()?;
        inner.users.insert(user.id.0, user);
        Ok(())
    }

    /// Fetch one request by id, for test assertions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store lock is
    /// poisoned.
    pub fn get(&self, id: RequestId) -> Result<Option<Request>> {
        let inner = self.lock()?;
        Ok(inner.requests.get(&id.0).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    /// Check-and-mutate under one lock acquisition. The closure sees
    /// the row only if the guard holds; `updated_at` refresh is
    /// applied on success.
    fn guarded_update(
        &self,
        id: RequestId,
        guard: impl Fn(&Request) -> bool,
        mutate: impl FnOnce(&mut Request),
    ) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(request) = inner.requests.get_mut(&id.0) else {
            return Ok(false);
        };
        if !guard(request) {
            return Ok(false);
        }
        mutate(request);
        request.updated_at = Utc::now();
        Ok(true)
    }
}

impl RequestStore for InMemoryRequestStore {
    async fn create(&self, request: &CreateRequest) -> Result<Request> {
        let mut inner = self.lock()?;

        // Find-or-create: an identical intake still pending wins.
        if let Some(existing) = inner.requests.values().find(|r| {
            r.status == Status::New
                && r.client_name == request.client_name
                && r.phone == request.phone
                && r.problem_text == request.problem_text
        }) {
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let now = Utc::now();
        let created = Request {
            id: RequestId(inner.next_id),
            client_name: request.client_name.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            problem_text: request.problem_text.clone(),
            status: Status::New,
            assigned_to: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        inner.requests.insert(created.id.0, created.clone());
        Ok(created)
    }

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<Request>> {
        let inner = self.lock()?;
        Ok(inner
            .requests
            .values()
            .filter(|r| filter.assigned_to.is_none_or(|m| r.assigned_to == Some(m)))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }

    async fn list_masters(&self) -> Result<Vec<User>> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .filter(|u| u.role == Role::Master)
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let inner = self.lock()?;
        Ok(inner.users.values().cloned().collect())
    }

    async fn apply_assign(&self, id: RequestId, master: UserId) -> Result<bool> {
        self.guarded_update(
            id,
            |r| r.status == Status::New,
            |r| {
                r.status = Status::Assigned;
                r.assigned_to = Some(master);
            },
        )
    }

    async fn apply_cancel(&self, id: RequestId) -> Result<bool> {
        self.guarded_update(
            id,
            |r| matches!(r.status, Status::New | Status::Assigned),
            |r| r.status = Status::Canceled,
        )
    }

    async fn apply_start(&self, id: RequestId, master: UserId) -> Result<bool> {
        self.guarded_update(
            id,
            |r| r.status == Status::Assigned && r.assigned_to == Some(master),
            |r| {
                r.status = Status::InProgress;
                r.version += 1;
            },
        )
    }

    async fn apply_finish(&self, id: RequestId, master: UserId) -> Result<bool> {
        self.guarded_update(
            id,
            |r| r.status == Status::InProgress && r.assigned_to == Some(master),
            |r| r.status = Status::Done,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn intake() -> CreateRequest {
        CreateRequest {
            client_name: "Alice".to_string(),
            phone: "555".to_string(),
            address: "1 Rd".to_string(),
            problem_text: "leak".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryRequestStore::new();
        let first = store.create(&intake()).await.unwrap();
        let second = store
            .create(&CreateRequest {
                client_name: "Bob".to_string(),
                ..intake()
            })
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn identical_pending_intake_is_not_duplicated() {
        let store = InMemoryRequestStore::new();
        let first = store.create(&intake()).await.unwrap();
        let second = store.create(&intake()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list(&RequestFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolved_intake_can_be_resubmitted() {
        let store = InMemoryRequestStore::new();
        let first = store.create(&intake()).await.unwrap();
        assert!(store.apply_assign(first.id, UserId(7)).await.unwrap());

        // No longer `new`, so the same intake creates a fresh record.
        let second = store.create(&intake()).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn guarded_write_on_missing_request_reports_no_change() {
        let store = InMemoryRequestStore::new();
        assert!(!store.apply_cancel(RequestId(42)).await.unwrap());
    }
}
