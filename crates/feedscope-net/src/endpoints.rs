use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};

const USER_AGENT: &str = concat!("feedscope/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client. No overall timeout is set because the
/// event stream stays open indefinitely.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")
}

/// URLs of the two server endpoints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub base: Url,
    pub health: Url,
    pub events: Url,
}

impl Endpoints {
    /// Resolve `health` and `events` relative to a base URL
    pub fn new(base: &str) -> Result<Self> {
        let mut base =
            Url::parse(base).with_context(|| format!("Invalid server URL '{}'", base))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Server URL '{}' cannot have paths", base);
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let health = base.join("health")?;
        let events = base.join("events")?;

        Ok(Self {
            base,
            health,
            events,
        })
    }
}
