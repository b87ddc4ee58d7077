use chrono::{Datelike, Local};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use storefront_insights::config::WarehouseConfig;
use storefront_insights::insights::{BusinessType, SqliteWarehouse};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// clap value parser for `--type`; accepts any casing of the category token.
pub(crate) fn parse_business_type(raw: &str) -> Result<BusinessType, String> {
    BusinessType::resolve(raw.trim()).map_err(|err| format!("{err} ('{raw}')"))
}

pub(crate) fn current_year() -> i32 {
    Local::now().year()
}

/// Opens the configured warehouse, or `path` when given on the command line.
pub(crate) fn warehouse(config: &WarehouseConfig, path: Option<PathBuf>) -> SqliteWarehouse {
    match path {
        Some(path) => SqliteWarehouse::new(path, config.busy_timeout),
        None => SqliteWarehouse::from_config(config),
    }
}
