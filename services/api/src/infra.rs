use agency_ops::agency::store::Clock;
use agency_ops::agency::{AgencyService, AgencyStores, InMemoryMediaStore};
use agency_ops::config::MediaConfig;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Agency service backed by process-local stores.
pub(crate) fn in_memory_service(clock: Arc<dyn Clock>, media: &MediaConfig) -> Arc<AgencyService> {
    let media_store = Arc::new(InMemoryMediaStore::new(
        media.public_base_url.clone(),
        media.max_bytes,
    ));
    Arc::new(AgencyService::new(AgencyStores::in_memory(
        clock,
        media_store,
    )))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    agency_ops::agency::window::parse_date(raw)
}
