//! merit-core - Core library for Merit
//!
//! This crate contains the record model, the offline-first local store, the
//! statistics engine, and the server sync logic used by every Merit front end.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use models::{NewRecord, Record, RecordKind, RecordUpdate};
pub use store::{Store, SyncOutcome};
