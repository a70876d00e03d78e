use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use auditlens_core::config::{AuthMode, Config};
use auditlens_duckdb::DuckDbBackend;
use auditlens_server::state::AppState;

/// `auditlens health` - liveness probe for container health checks.
///
/// Calls `GET http://localhost:$AUDITLENS_PORT/health` and exits 0 on HTTP 200,
/// 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("AUDITLENS_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auditlens=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/auditlens.db", cfg.data_dir);
    let db = DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    if !std::path::Path::new(&cfg.geoip_path).exists() {
        warn!(
            geoip_path = %cfg.geoip_path,
            "GeoIP database not found. Visits are stored with NULL country/city; \
             set AUDITLENS_GEOIP_PATH to a GeoLite2-City database to enable lookups."
        );
    }

    match &cfg.auth_mode {
        AuthMode::Jwt(_) => info!("Auth enabled: admin bearer token required for reads"),
        AuthMode::None => warn!("Auth disabled (AUDITLENS_AUTH=none): every caller is admin"),
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    info!(port = cfg.port, timezone = %cfg.timezone, "Auditlens listening on {}", addr);

    let state = Arc::new(AppState::new(db, cfg));
    let app = auditlens_server::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
    })
    .await?;

    Ok(())
}
