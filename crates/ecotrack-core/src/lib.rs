//! # Ecotrack Core Library
//!
//! This library provides the core business logic for the Ecotrack
//! sustainability tracker. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI
//! front end being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Catalog**: Static goal categories, point values and daily-task
//!   templates
//! - **Progress**: Session-scoped completion state with derived points
//! - **Persistence**: Dual-backend adapter over a remote REST store and a
//!   local SQLite key-value snapshot
//! - **Daily Tasks**: Deterministic shared batch generation with
//!   per-identity completion
//! - **Reconciliation**: Anonymous-to-account progress merge flow
//!
//! ## Key Components
//!
//! - [`Tracker`]: Facade tying the engines together per session
//! - [`Catalog`]: Read-only goal and template definitions
//! - [`PersistenceAdapter`]: Load/save with fallback and refresh-retry
//! - [`DailyTaskEngine`]: Daily bonus task generation and completion
//! - [`ReconciliationEngine`]: Stash, prompt and resolve merges

pub mod adapter;
pub mod auth;
pub mod catalog;
pub mod daily;
pub mod error;
pub mod progress;
pub mod reconcile;
pub mod remote;
pub mod storage;
pub mod tracker;

pub use adapter::{LoadSource, LoadedProgress, PersistenceAdapter, SaveOutcome};
pub use auth::{AuthProvider, Identity, RefreshOutcome, StoredSession, SupabaseAuth};
pub use catalog::{Catalog, Category, Goal, GoalId, TaskTemplate};
pub use daily::{CompleteOutcome, DailyTask, DailyTaskEngine, DAILY_BATCH_SIZE};
pub use error::{AuthError, CoreError, StoreError};
pub use progress::ProgressStore;
pub use reconcile::{MergeDecision, ReconciliationEngine};
pub use remote::{MemoryRemote, RemoteError, RemoteStore, SupabaseStore};
pub use storage::{Config, LocalStore, MemoryStore, SqliteStore};
pub use tracker::{TaskCompletion, ToggleResult, Tracker};
