#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Consolidated multi-period financial statements from SEC filings.
//!
//! This crate re-exports the core types, the consolidation engine, the stores
//! and the EDGAR adapter, and provides a [`StatementPipeline`] that drives
//! them for one company at a time.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR adapter and [`StatementPipeline::with_edgar`]
//! - `cache-sqlite` - SQLite-backed statement store
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use filings::{Frequency, SqliteStore, StatementPipeline, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> filings::Result<()> {
//!     let pipeline = StatementPipeline::with_edgar("MyApp/1.0 (contact@example.com)")?
//!         .with_store(Arc::new(SqliteStore::new("filings.db")?));
//!
//!     let statements = pipeline.build_all(&Symbol::new("AAPL"), Frequency::Quarterly).await?;
//!     for (kind, statement) in statements.iter() {
//!         println!("{kind}\n{}", statement.to_frame()?);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use filings_core::*;

// Consolidation engine
pub use filings_engine as engine;

// Store implementations
#[cfg(feature = "cache-sqlite")]
pub use filings_cache::SqliteStore;
pub use filings_cache::{InMemoryStore, NoopStore};

// Providers
#[cfg(feature = "edgar")]
pub use filings_edgar::EdgarProvider;

mod config;
mod pipeline;

pub use config::{DEFAULT_MAX_FILINGS, PipelineConfig};
pub use pipeline::{StatementPipeline, StatementSet};
