use crate::cli::ServeArgs;
use crate::infra::{in_memory_service, AppState};
use crate::routes::with_agency_routes;
use agency_ops::agency::store::{Clock, SystemClock};
use agency_ops::config::AppConfig;
use agency_ops::error::AppError;
use agency_ops::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    let overridden = args.host.is_some() || args.port.is_some();
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    // Hosted image URLs follow the bind address unless a CDN base is configured.
    if overridden && std::env::var_os("AGENCY_MEDIA_BASE_URL").is_none() {
        config.media.public_base_url =
            format!("http://{}:{}/media", config.server.host, config.server.port);
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let agency_service = in_memory_service(clock, &config.media);

    let app = with_agency_routes(agency_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        media_base_url = %config.media.public_base_url,
        "agency operations service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
