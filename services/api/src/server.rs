use crate::cli::ServeArgs;
use crate::infra::{warehouse, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use storefront_insights::config::AppConfig;
use storefront_insights::error::AppError;
use storefront_insights::insights::InsightsService;
use storefront_insights::telemetry;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let warehouse = Arc::new(warehouse(&config.warehouse, args.warehouse.take()));
    let warehouse_path = warehouse.path().display().to_string();
    let service = Arc::new(InsightsService::new(warehouse));

    if let Err(err) = service.ping().await {
        warn!(warehouse = %warehouse_path, error = %err, "warehouse not reachable at startup");
    }

    let app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, warehouse = %warehouse_path, "storefront insights api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
