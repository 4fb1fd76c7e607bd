use crate::config::Config;
use crate::skin::FetchError;
use log::debug;
use std::time::Duration;

pub const DEFAULT_SKIN_API_URL: &str = "https://mineskin.eu/skin/";

/// Source of raw skin bytes for a key.
pub trait SkinFetcher: Send + Sync {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an agent with per-phase timeouts. Status codes are returned as
/// responses so the caller can classify them.
pub fn build_agent(connect_timeout: Duration, read_timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_connect(Some(connect_timeout))
        .timeout_recv_response(Some(read_timeout))
        .timeout_recv_body(Some(read_timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

pub fn skin_url(base_url: &str, key: &str) -> String {
    format!("{base_url}{}", urlencoding::encode(key))
}

pub struct HttpSkinFetcher {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSkinFetcher {
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            agent: build_agent(connect_timeout, read_timeout),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.skin_base_url.clone(),
            Duration::from_millis(u64::from(cfg.connect_timeout_ms)),
            Duration::from_millis(u64::from(cfg.read_timeout_ms)),
        )
    }
}

impl SkinFetcher for HttpSkinFetcher {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        let url = skin_url(&self.base_url, key);
        debug!("Request URL: {url}");

        let resp = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        debug!("HTTP response code for '{key}': {}", status.as_u16());
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let mut body = resp.into_body();
        body.read_to_vec()
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
