//! Remote data-store boundary.
//!
//! Upper layers never see raw HTTP or backend error shapes: everything is
//! classified at this boundary into the closed [`RemoteError`] kinds
//! (not-found / session-invalid / transient) before it crosses upward.

pub mod client;
pub mod memory;
pub mod types;

pub use client::SupabaseStore;
pub use memory::MemoryRemote;
pub use types::{DailyTaskRow, ProgressRecord, RemoteError, RemoteStore};
