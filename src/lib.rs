//! watchwarm - cache warming for the watchlist app.
//!
//! Two cooperating pieces: a retrying HTTP fetcher for rate-limited
//! upstreams, and a prefetch queue that warms detail pages ahead of
//! navigation from hover hints.

pub mod config;
pub mod http_client;
pub mod prefetch;
pub mod rate_limit;
pub mod server;
