// src/config.rs
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    // core 的 host:port，例如 "localhost:16662"
    pub core_addr: String,
    // true 时走 https/wss
    pub secure: bool,
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl Config {
    pub fn new() -> Self {
        Self {
            core_addr: std::env::var("CORE_ADDR").unwrap_or_else(|_| "localhost:16662".to_string()),
            secure: false,
            request_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    pub fn http_base(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}/api/v1", scheme, self.core_addr)
    }

    pub fn events_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}/api/v1/events/all/stream", scheme, self.core_addr)
    }
}
