//! Shared HTTP client

use crate::Result;
use once_cell::sync::OnceCell;
use std::time::Duration;

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// The process-wide async client, built on first use.
///
/// Public tile servers reject requests without a User-Agent, so one is always set.
pub fn http_client() -> Result<&'static reqwest::Client> {
    HTTP_CLIENT.get_or_try_init(|| {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trackmap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(16)
            .build()?;
        Ok(client)
    })
}
