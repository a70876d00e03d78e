use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use auditlens_core::analytics::AnalyticsBackend;
use auditlens_core::config::Config;
use auditlens_core::error::RangeError;
use auditlens_core::period::{resolve_range, DateRange, RangeParams};
use auditlens_duckdb::DuckDbBackend;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The concrete DuckDB backend, kept for the health probe.
    pub db: Arc<DuckDbBackend>,

    /// The same backend behind the storage seam the core operates on.
    pub analytics: Arc<dyn AnalyticsBackend>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// GeoIP database, opened once. `None` when the file is absent or
    /// unreadable; visits are then stored without country/city.
    pub geoip: Option<Arc<maxminddb::Reader<Vec<u8>>>>,
}

impl AppState {
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let db = Arc::new(db);
        let geoip = open_geoip(&config.geoip_path);
        Self {
            analytics: db.clone(),
            db,
            config: Arc::new(config),
            geoip,
        }
    }

    /// Resolve range parameters against the wall clock in the reporting zone.
    pub fn resolve_range(&self, params: &RangeParams) -> Result<DateRange, RangeError> {
        resolve_range(params, Utc::now(), self.config.timezone)
    }
}

fn open_geoip(path: &str) -> Option<Arc<maxminddb::Reader<Vec<u8>>>> {
    if !std::path::Path::new(path).exists() {
        return None;
    }
    match maxminddb::Reader::open_readfile(path) {
        Ok(reader) => {
            info!(geoip_path = %path, "GeoIP database loaded");
            Some(Arc::new(reader))
        }
        Err(e) => {
            warn!(geoip_path = %path, error = %e, "GeoIP database unreadable; geo fields disabled");
            None
        }
    }
}
