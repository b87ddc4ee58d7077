//! Insight endpoints over the per-category reporting views.
//!
//! Every endpoint follows the same path: resolve the business type to its
//! view, build a bound predicate from the request filters, run one aggregate
//! statement through the [`Warehouse`] seam, and shape positional rows into
//! named records.

pub mod advisory;
pub mod business;
pub mod filters;
pub mod forecast;
pub mod growth;
pub mod impact;
pub mod loader;
pub mod query;
pub mod records;
pub mod router;
pub mod service;
pub mod sqlite;
pub mod warehouse;

#[cfg(test)]
mod tests;

pub use advisory::{Advice, Assessment, Confidence, KeyMetrics};
pub use business::{BusinessType, InvalidBusinessType};
pub use filters::{Column, FilterSet, Param, Predicate};
pub use forecast::{Forecast, ForecastPoint};
pub use growth::CityGrowth;
pub use impact::PolicyImpact;
pub use loader::{LoadError, ReportLoader, ReportRow};
pub use query::{Statement, ViewQuery};
pub use records::DataEnvelope;
pub use router::{insights_router, InsightsQuery};
pub use service::{InsightsError, InsightsService};
pub use sqlite::SqliteWarehouse;
pub use warehouse::{Cell, Row, StoreError, Warehouse};
