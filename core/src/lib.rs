//! Core request lifecycle state machine for Workorder.
//!
//! This crate models repair-service requests moving through a fixed
//! lifecycle (`new → assigned → in_progress → done`, with `canceled`
//! reachable from the first two states) under concurrent actors:
//! clients create requests, dispatchers assign or cancel them, and
//! masters (field workers) start and finish assigned work.
//!
//! # Design
//!
//! Correctness under concurrency rests on a single primitive: every
//! mutating store operation is an atomic conditional write whose
//! precondition is part of the write itself. The [`TransitionEngine`]
//! never reads state to decide whether a transition is legal - it
//! issues the guarded write and classifies "zero rows matched" as a
//! [`Outcome::Conflict`], the expected result of a lost race or a
//! stale caller view. The core holds no locks and no ambient state;
//! the backing store's atomicity guarantee is the only
//! synchronization.
//!
//! # Implementations
//!
//! - `PostgresRequestStore` (in `workorder-postgres`): production
//!   store backed by `PostgreSQL` conditional updates
//! - [`memory::InMemoryRequestStore`]: fast, deterministic testing
//!
//! # Example
//!
//! ```
//! use workorder_core::{
//!     Action, Actor, CreateRequest, Outcome, Role, Transition, TransitionEngine, UserId,
//! };
//! use workorder_core::memory::InMemoryRequestStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryRequestStore::new();
//! let engine = TransitionEngine::new(store);
//!
//! let request = engine
//!     .create(CreateRequest {
//!         client_name: "Alice".into(),
//!         phone: "555".into(),
//!         address: "1 Rd".into(),
//!         problem_text: "leak".into(),
//!     })
//!     .await?;
//!
//! let dispatcher = Actor { id: UserId(1), role: Role::Dispatcher };
//! let outcome = engine
//!     .execute(dispatcher, Transition {
//!         action: Action::Assign,
//!         request_id: request.id,
//!         target: Some(UserId(7)),
//!     })
//!     .await?;
//! assert_eq!(outcome, Outcome::Applied);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod memory;
pub mod request;
pub mod store;
pub mod user;

pub use engine::{Action, Dashboard, Outcome, Transition, TransitionEngine};
pub use error::{EngineError, StoreError};
pub use request::{CreateRequest, Request, RequestFilter, RequestId, Status};
pub use store::RequestStore;
pub use user::{Actor, Role, User, UserId};
