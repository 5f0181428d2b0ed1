use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CHANNEL_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub channel_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_secs: u64 = try_load(&lookup, "POS_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS);
        let channel_buffer: usize = try_load(&lookup, "POS_CHANNEL_BUFFER", DEFAULT_CHANNEL_BUFFER);

        Self {
            api_base_url: try_load(&lookup, "POS_API_BASE_URL", DEFAULT_API_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            channel_buffer: channel_buffer.max(1),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
