//! Shared domain logic for the chorus import pipeline.
//!
//! Everything in this crate is synchronous and I/O-free:
//!
//! - [`rows`] — CSV sheet parsing into typed rows.
//! - [`matching`] — fuzzy name matching for composers and piece titles.
//! - [`job`] / [`status`] — the job snapshot exchanged over the status
//!   wire and its lifecycle states.
//! - [`progress`] / [`dates`] / [`naming`] — small pure helpers.
//!
//! The async crates (`chorus-jobs`, `chorus-api`, `chorus-client`)
//! build on these types.

pub mod dates;
pub mod events;
pub mod job;
pub mod matching;
pub mod naming;
pub mod progress;
pub mod rows;
pub mod status;
pub mod types;

pub use events::EventKind;
pub use job::{ImportJob, ImportResult};
pub use status::JobStatus;
pub use types::JobId;
