use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use workforce_data::ingest::CsvIngestor;
use workforce_data::store::HiringStore;

/// Process-level state for the operational endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Everything the hiring endpoints need: the shared store plus the ingestor
/// wired to it.
pub(crate) struct ApiContext<S> {
    pub(crate) store: Arc<S>,
    pub(crate) ingestor: CsvIngestor<S>,
}

impl<S: HiringStore> ApiContext<S> {
    pub(crate) fn new(store: Arc<S>) -> Self {
        let ingestor = CsvIngestor::new(store.clone());
        Self { store, ingestor }
    }
}

/// Default page window for the browse endpoints.
pub(crate) const DEFAULT_PAGE_LIMIT: usize = 100;
