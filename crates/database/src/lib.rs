//! # Perps Dashboard Database Crate
//!
//! The data-access layer of the dashboard: a pooled PostgreSQL client that
//! reads pre-aggregated perps statistics from the analytics warehouse.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** This crate encapsulates all database-specific logic. Callers
//!   hand it typed identifiers and dates and get a `VolumeTable` back.
//! - **Bound values, allow-listed identifiers:** Dates travel as query
//!   parameters. Schema and table names are built only from the `Chain`,
//!   `Environment` and `Resolution` enums.
//! - **Asynchronous & Pooled:** Each query borrows one connection from a
//!   bounded `PgPool` for its own duration and returns it on drop.
//!
//! ## Public API
//!
//! - `VolumeQueryService`: Owns the pool and exposes `get_volume` and `close`.
//! - `ServiceMetrics`: Diagnostic counters (services created, queries run).
//! - `connect_options` / `build_pool`: Lower-level pool construction.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod metrics;
pub mod service;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{build_pool, connect_options};
pub use error::DbError;
pub use metrics::ServiceMetrics;
pub use service::{VolumeQueryService, volume_table_name};
