//! CSV ingestion and hiring reports over a departments/jobs/employees schema.
//!
//! The `store` module owns the entities and the storage seam, `ingest` maps
//! uploaded CSV batches onto it, and `reports` runs the two fixed hiring
//! aggregations. The remaining modules carry service plumbing shared by the
//! HTTP binary.

pub mod config;
pub mod error;
pub mod ingest;
pub mod reports;
pub mod store;
pub mod telemetry;
