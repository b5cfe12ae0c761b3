//! Batch importer for the membership hub database.
//!
//! Source exports (JSON arrays and CSV directories) are reconciled into the
//! relational hub schema by one importer per entity, run in dependency order
//! by the pipeline driver. Records are matched by natural key, so repeated
//! runs update rather than duplicate.

pub mod config;
pub mod domain;
pub mod error;
pub mod importers;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod telemetry;
