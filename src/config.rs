use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API (scheme, host, optional port).
    pub api_base_url: Url,
    /// Path of the push hub, relative to the base URL.
    pub hub_path: String,
    /// Where the signed-in session is persisted.
    pub session_file: PathBuf,
    /// Role-upgrade / account-status poll interval, seconds.
    /// Set via TOURDASH_POLL_SECS. Default: 30.
    pub poll_interval_secs: u64,
    /// Notification poll interval, seconds.
    /// Set via TOURDASH_NOTIFICATION_POLL_SECS. Default: 60.
    pub notification_poll_secs: u64,
    /// Per-request HTTP timeout, seconds.
    pub timeout_secs: u64,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn notification_poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// WebSocket URL of the push hub (`http` → `ws`, `https` → `wss`).
    pub fn hub_url(&self) -> anyhow::Result<Url> {
        let mut url = self
            .api_base_url
            .join(&self.hub_path)
            .with_context(|| format!("invalid hub path '{}'", self.hub_path))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| anyhow::anyhow!("cannot use {} as a websocket url", url))?;
        Ok(url)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build the config from any key lookup (the environment in production).
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let raw_base = lookup("TOURDASH_API_BASE_URL").unwrap_or_else(|| "http://localhost".into());
    let mut api_base_url =
        Url::parse(&raw_base).with_context(|| format!("TOURDASH_API_BASE_URL is not a url: {}", raw_base))?;

    if let Some(port) = lookup("TOURDASH_API_PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
        api_base_url
            .set_port(Some(port))
            .map_err(|_| anyhow::anyhow!("cannot set port {} on {}", port, api_base_url))?;
    }

    let session_file = lookup("TOURDASH_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| ".".into());
            PathBuf::from(home).join(".tourdash").join("session.json")
        });

    Ok(Config {
        api_base_url,
        hub_path: lookup("TOURDASH_HUB_PATH").unwrap_or_else(|| "/hubs/notification".into()),
        session_file,
        poll_interval_secs: lookup("TOURDASH_POLL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        notification_poll_secs: lookup("TOURDASH_NOTIFICATION_POLL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
        timeout_secs: lookup("TOURDASH_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
    })
}
