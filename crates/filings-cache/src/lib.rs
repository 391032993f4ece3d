#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Implementations of the [`StatementStore`] trait from `filings-core`:
//!
//! - [`SqliteStore`] - Persistent SQLite-backed store (default, requires `sqlite` feature)
//! - [`InMemoryStore`] - In-memory store for tests
//! - [`NoopStore`] - Store that keeps nothing

/// In-memory store implementation.
pub mod memory;
/// No-op store implementation.
pub mod noop;

/// SQLite-backed store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use filings_core::StatementStore;

pub use memory::InMemoryStore;
pub use noop::NoopStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
