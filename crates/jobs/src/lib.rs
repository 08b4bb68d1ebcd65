//! Import job execution for the chorus server.
//!
//! This crate owns everything between "a sheet was uploaded" and "the
//! status endpoint has something to say":
//!
//! - [`JobRegistry`] — in-memory store of job snapshots, the single
//!   source of truth the status endpoint reads.
//! - [`reaper`] — background expiry of finished jobs.
//! - [`Catalog`] — the seam to the choir catalog (collections, pieces,
//!   composers, events) with an in-memory implementation.
//! - [`event_import`] / [`collection_import`] — the executors that walk
//!   parsed rows and drive a job to its terminal state.
//! - [`runner`] — glue that registers a job and spawns its executor.

pub mod catalog;
pub mod collection_import;
pub mod event_import;
pub mod reaper;
pub mod registry;
pub mod runner;

pub use catalog::{Catalog, CatalogError, CatalogId, Collection, Composer, MemoryCatalog, Piece};
pub use collection_import::{Resolution, Resolutions};
pub use registry::JobRegistry;
