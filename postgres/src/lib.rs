//! `PostgreSQL` request store for Workorder.
//!
//! Production implementation of the `RequestStore` trait from
//! `workorder-core`. Every lifecycle transition is a single
//! conditional `UPDATE` whose `WHERE` clause carries the state
//! machine's precondition; the affected-row count decides between an
//! applied transition and a lost race. No rows are ever locked or
//! pre-read to make that decision.
//!
//! # Example
//!
//! ```no_run
//! use workorder_postgres::{PostgresRequestStore, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::from_env()?;
//! let store = PostgresRequestStore::connect(&config).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod store;

pub use config::{ConfigError, StoreConfig};
pub use store::PostgresRequestStore;
