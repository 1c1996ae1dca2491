//! Batch prefetch from the command line.

use watchwarm::config::Settings;
use watchwarm::prefetch::{ContentKey, HttpPrefetchClient, PrefetchQueue, Priority};

/// Enqueue `keys`, wait for the queue and any related warm-ups, then print stats.
pub async fn cmd_prefetch(
    settings: &Settings,
    keys: Vec<ContentKey>,
    priority: Priority,
    base_url: Option<&str>,
) -> anyhow::Result<()> {
    let base_url = base_url.unwrap_or(settings.base_url.as_str());
    let client = HttpPrefetchClient::new(
        base_url,
        settings.request_timeout(),
        settings.user_agent.as_deref(),
    )?
    .with_related_limit(settings.related_limit);

    let config = settings.prefetch_config();
    let related_delay = config.related_delay;
    let prefetch_related = config.prefetch_related;
    let queue = PrefetchQueue::new(client, config);

    let total = keys.len();
    let accepted = queue.enqueue_batch(keys, priority).await;
    eprintln!("Queued {} of {} keys against {}", accepted, total, base_url);

    queue.wait_idle().await;

    // Related warm-ups are detached; give the last one time to land.
    if prefetch_related && accepted > 0 {
        tokio::time::sleep(related_delay + settings.request_timeout()).await;
    }

    let stats = queue.get_cache_stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if stats.failed > 0 {
        anyhow::bail!("{} key(s) failed to prefetch", stats.failed);
    }
    Ok(())
}
