use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/chat";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant chat endpoint; its base path answers the reachability probe.
    pub api_url: String,
    pub probe_timeout: Duration,
    pub port: u16,
    /// Chat sessions idle for this long are dropped.
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let api_url = std::env::var("ECOCHAT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let probe_secs = parse_env("ECOCHAT_PROBE_TIMEOUT_SECS", DEFAULT_PROBE_TIMEOUT_SECS);
        let port = parse_env("PORT", DEFAULT_PORT);
        let ttl_secs = parse_env("ECOCHAT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS);
        Self {
            api_url,
            probe_timeout: Duration::from_secs(probe_secs),
            port,
            session_ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Chat URL with its first `/chat` segment removed.
    pub fn probe_url(&self) -> String {
        self.api_url.replacen("/chat", "", 1)
    }
}

fn parse_env<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("⚠️ Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
