use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use covid_tracker::api::{router, ApiState};
use covid_tracker::config::Config;
use covid_tracker::error::Result;
use covid_tracker::fetcher::DiseaseClient;
use covid_tracker::format::{format_epoch_millis, thousands};
use covid_tracker::i18n::Catalog;
use covid_tracker::metrics::derive;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Translation tables: fail fast before serving anything ---
    let catalog = Catalog::load()?;
    info!("Translations loaded, serving locale {}", cfg.locale);

    let client = DiseaseClient::new(&cfg)?;
    info!("Upstream API: {}", client.base_url());

    // --- Startup probe: one summary fetch so a dead upstream shows up in the log ---
    match client.fetch_summary().await {
        Ok(summary) => {
            let pct = derive(&summary);
            info!(
                event = "UPSTREAM_PROBE",
                cases = summary.cases,
                deaths = summary.deaths,
                recovered = summary.recovered,
                "Upstream reachable | cases: {} | active {}% recovered {}% deaths {}% | updated {}",
                thousands(summary.cases),
                pct.active_pct,
                pct.recovered_pct,
                pct.deaths_pct,
                format_epoch_millis(summary.updated),
            );
        }
        Err(e) => warn!("Upstream probe failed, serving anyway: {e}"),
    }

    // --- HTTP API server ---
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let app = router(ApiState::new(cfg, client, catalog));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
