//! Control API for the prefetch queue.
//!
//! Browser hover handlers and batch jobs talk to one shared
//! [`PrefetchQueue`] through a small JSON API; a maintenance task clears the
//! queue's bookkeeping on the configured interval.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::Settings;
use crate::prefetch::{spawn_maintenance, HttpPrefetchClient, PrefetchClient, PrefetchQueue};

/// Shared state for the control API.
pub struct AppState<C: PrefetchClient = HttpPrefetchClient> {
    pub queue: PrefetchQueue<C>,
    /// Delay applied to hover requests that do not name one.
    pub hover_delay: Duration,
}

impl<C: PrefetchClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            hover_delay: self.hover_delay,
        }
    }
}

impl<C: PrefetchClient> AppState<C> {
    pub fn new(queue: PrefetchQueue<C>) -> Self {
        let hover_delay = queue.config().hover_delay;
        Self { queue, hover_delay }
    }
}

impl AppState {
    /// Build the queue and HTTP client described by `settings`.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = HttpPrefetchClient::new(
            &settings.base_url,
            settings.request_timeout(),
            settings.user_agent.as_deref(),
        )?
        .with_related_limit(settings.related_limit);

        Ok(Self::new(PrefetchQueue::new(
            client,
            settings.prefetch_config(),
        )))
    }
}

/// Start the control API and the maintenance task.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings)?;
    let maintenance = spawn_maintenance(
        state.queue.clone(),
        state.queue.config().clear_interval,
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting control API at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let result = axum::serve(listener, app).await;
    maintenance.abort();
    result?;

    Ok(())
}
