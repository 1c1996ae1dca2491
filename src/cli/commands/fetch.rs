//! One-off retrying fetch.

use std::io::Write;
use std::time::Duration;

use watchwarm::config::Settings;
use watchwarm::http_client::RetryingFetcher;

/// GET `url` with the configured retry policy. Status goes to stderr, body to stdout.
pub async fn cmd_fetch(
    settings: &Settings,
    url: &str,
    retries: Option<u32>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let mut policy = settings.fetch_policy();
    if let Some(retries) = retries {
        policy.max_retries = retries;
    }
    if let Some(secs) = timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout must be at least 1 second");
        policy.timeout = Duration::from_secs(secs);
    }

    let fetcher = RetryingFetcher::new(policy, settings.user_agent.as_deref());
    let response = fetcher.get(url).await?;

    eprintln!("HTTP {}", response.status);
    if let Some(content_type) = response.content_type() {
        eprintln!("Content-Type: {}", content_type);
    }
    let body = response.bytes().await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body)?;
    stdout.flush()?;

    Ok(())
}
