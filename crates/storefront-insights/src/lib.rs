//! Read-only analytics over the per-category business reporting views.

pub mod config;
pub mod error;
pub mod insights;
pub mod telemetry;
