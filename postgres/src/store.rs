//! `PostgreSQL` implementation of the request store.

use crate::config::StoreConfig;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use workorder_core::error::Result;
use workorder_core::{
    CreateRequest, Request, RequestFilter, RequestId, RequestStore, Role, Status, StoreError,
    User, UserId,
};

const REQUEST_COLUMNS: &str =
    "id, client_name, phone, address, problem_text, status, assigned_to, version, created_at, updated_at";

/// `PostgreSQL` request store.
///
/// Wraps a connection pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresRequestStore {
    pool: PgPool,
}

impl PostgresRequestStore {
    /// Create a store from an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be
    /// reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the schema if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if a statement fails.
    pub async fn migrate(&self) -> Result<()> {
        const SCHEMA: &[&str] = &[
            r"
            CREATE TABLE IF NOT EXISTS requests (
                id BIGSERIAL PRIMARY KEY,
                client_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                address TEXT NOT NULL,
                problem_text TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                assigned_to BIGINT,
                version BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_requests_assignee ON requests(assigned_to, status)",
            r"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL
            )
            ",
        ];

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))?;
        }
        tracing::debug!("schema ready");
        Ok(())
    }

    /// Run a guarded transition write and report whether exactly one
    /// row changed. `false` means the precondition matched nothing -
    /// a lost race or a stale caller view, not an error.
    async fn guarded_update(
        &self,
        query: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>,
        context: &'static str,
    ) -> Result<bool> {
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to {context}: {e}")))?;
        Ok(result.rows_affected() == 1)
    }
}

fn list_builder(filter: &RequestFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {REQUEST_COLUMNS} FROM requests WHERE 1=1"
    ));
    if let Some(master) = filter.assigned_to {
        builder.push(" AND assigned_to = ");
        builder.push_bind(master.0);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    builder.push(" ORDER BY id");
    builder
}

fn decode_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("failed to decode row: {e}"))
}

fn request_from_row(row: &PgRow) -> Result<Request> {
    let status: String = row.try_get("status").map_err(decode_err)?;
    let assigned_to: Option<i64> = row.try_get("assigned_to").map_err(decode_err)?;

    Ok(Request {
        id: RequestId(row.try_get("id").map_err(decode_err)?),
        client_name: row.try_get("client_name").map_err(decode_err)?,
        phone: row.try_get("phone").map_err(decode_err)?,
        address: row.try_get("address").map_err(decode_err)?,
        problem_text: row.try_get("problem_text").map_err(decode_err)?,
        status: Status::from_str(&status).map_err(decode_err)?,
        assigned_to: assigned_to.map(UserId),
        version: row.try_get("version").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role").map_err(decode_err)?;

    Ok(User {
        id: UserId(row.try_get("id").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
        role: Role::from_str(&role).map_err(decode_err)?,
    })
}

impl RequestStore for PostgresRequestStore {
    async fn create(&self, request: &CreateRequest) -> Result<Request> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to start transaction: {e}")))?;

        // Find-or-create in one transaction: an identical intake
        // still pending is returned instead of inserting a duplicate,
        // so a caller retry cannot fan out into several records.
        let existing = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM requests \
             WHERE client_name = $1 AND phone = $2 AND problem_text = $3 AND status = 'new' \
             ORDER BY id LIMIT 1"
        ))
        .bind(&request.client_name)
        .bind(&request.phone)
        .bind(&request.problem_text)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::Unavailable(format!("failed to look up request: {e}")))?;

        if let Some(row) = existing {
            tx.commit()
                .await
                .map_err(|e| StoreError::Unavailable(format!("failed to commit: {e}")))?;
            let found = request_from_row(&row)?;
            tracing::debug!(request_id = %found.id, "pending request already exists");
            return Ok(found);
        }

        let row = sqlx::query(&format!(
            "INSERT INTO requests (client_name, phone, address, problem_text, status, version) \
             VALUES ($1, $2, $3, $4, 'new', 0) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(&request.client_name)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(&request.problem_text)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::Unavailable(format!("failed to insert request: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to commit: {e}")))?;

        request_from_row(&row)
    }

    async fn list(&self, filter: &RequestFilter) -> Result<Vec<Request>> {
        let mut builder = list_builder(filter);
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to list requests: {e}")))?;
        rows.iter().map(request_from_row).collect()
    }

    async fn list_masters(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, role FROM users WHERE role = 'master' ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to list masters: {e}")))?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, role FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to list users: {e}")))?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list_dashboard(
        &self,
        filter: &RequestFilter,
    ) -> Result<(Vec<Request>, Vec<User>)> {
        // Both reads in one transaction so the request listing and
        // the master roster come from the same snapshot.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to start transaction: {e}")))?;

        let mut builder = list_builder(filter);
        let request_rows = builder
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to list requests: {e}")))?;

        let master_rows =
            sqlx::query("SELECT id, name, role FROM users WHERE role = 'master' ORDER BY id")
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| StoreError::Unavailable(format!("failed to list masters: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to commit: {e}")))?;

        let requests = request_rows
            .iter()
            .map(request_from_row)
            .collect::<Result<Vec<_>>>()?;
        let masters = master_rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok((requests, masters))
    }

    async fn apply_assign(&self, id: RequestId, master: UserId) -> Result<bool> {
        self.guarded_update(
            sqlx::query(
                "UPDATE requests SET status = 'assigned', assigned_to = $2, updated_at = now() \
                 WHERE id = $1 AND status = 'new'",
            )
            .bind(id.0)
            .bind(master.0),
            "assign request",
        )
        .await
    }

    async fn apply_cancel(&self, id: RequestId) -> Result<bool> {
        self.guarded_update(
            sqlx::query(
                "UPDATE requests SET status = 'canceled', updated_at = now() \
                 WHERE id = $1 AND status IN ('new', 'assigned')",
            )
            .bind(id.0),
            "cancel request",
        )
        .await
    }

    async fn apply_start(&self, id: RequestId, master: UserId) -> Result<bool> {
        // The optimistic-lock point: status and assignee are
        // re-checked inside the UPDATE itself, so of two racing
        // starts only the first to commit matches a row.
        self.guarded_update(
            sqlx::query(
                "UPDATE requests \
                 SET status = 'in_progress', version = version + 1, updated_at = now() \
                 WHERE id = $1 AND status = 'assigned' AND assigned_to = $2",
            )
            .bind(id.0)
            .bind(master.0),
            "start request",
        )
        .await
    }

    async fn apply_finish(&self, id: RequestId, master: UserId) -> Result<bool> {
        self.guarded_update(
            sqlx::query(
                "UPDATE requests SET status = 'done', updated_at = now() \
                 WHERE id = $1 AND status = 'in_progress' AND assigned_to = $2",
            )
            .bind(id.0)
            .bind(master.0),
            "finish request",
        )
        .await
    }
}
