use anyhow::Result;
use nsescraper::{config::PgConfig, pipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Verification-only entry point: read the latest snapshot of both report
/// tables back from storage, preview them, and write the verification
/// workbook, without touching the report page.
fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("verification startup");

    let cfg = PgConfig::from_env();
    if let Err(e) = pipeline::verify_once(&cfg) {
        error!("verification failed: {:#}", e);
    }

    info!("all done");
    Ok(())
}
