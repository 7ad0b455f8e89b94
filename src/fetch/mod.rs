use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

/// The FII/DII daily activity report page.
pub const REPORT_URL: &str = "https://www.nseindia.com/reports/fii-dii";

/// The site rejects clients that do not look like a desktop browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/115 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A blocking client with a cookie store; the report endpoint only answers
/// once the session cookies from the origin page are present.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("building http client")
}

/// Fetch the report page HTML: warm the session against the site origin
/// first, then request the report itself.
pub fn fetch_report_html(client: &Client, report_url: &str) -> Result<String> {
    let origin = origin_of(report_url)?;
    info!(%origin, "warming up session");
    client
        .get(&origin)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("warming up session against {}", origin))?;

    info!(url = report_url, "fetching report page");
    let html = client
        .get(report_url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("requesting {}", report_url))?
        .text()
        .context("reading report page body")?;
    Ok(html)
}

fn origin_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("parsing url {}", url))?;
    Ok(parsed.origin().ascii_serialization())
}
