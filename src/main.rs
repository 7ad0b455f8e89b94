use anyhow::Result;
use nsescraper::{config::PgConfig, pipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) load storage config ──────────────────────────────────────
    let cfg = PgConfig::from_env();

    // ─── 3) scrape, sink, export ─────────────────────────────────────
    if let Err(e) = pipeline::scrape_once(&cfg) {
        error!("scrape run failed: {:#}", e);
    }

    // ─── 4) verify from storage ──────────────────────────────────────
    if let Err(e) = pipeline::verify_once(&cfg) {
        error!("verification failed: {:#}", e);
    }

    info!("all done");
    Ok(())
}
