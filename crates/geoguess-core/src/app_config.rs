use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub google_maps_api_key: Option<String>,
    pub nominatim_base_url: String,
    pub streetview_metadata_url: String,
    pub user_agent: String,
    /// Directory holding one persisted sub-area file per place key.
    pub cache_dir: Option<PathBuf>,
    pub geocoder_timeout_secs: u64,
    pub discovery_timeout_secs: u64,
    pub streetview_timeout_secs: u64,
    pub discovery_concurrency: usize,
    pub discovery_jitter_min_ms: u64,
    pub discovery_jitter_max_ms: u64,
    pub discovery_result_limit: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("nominatim_base_url", &self.nominatim_base_url)
            .field("streetview_metadata_url", &self.streetview_metadata_url)
            .field("user_agent", &self.user_agent)
            .field("cache_dir", &self.cache_dir)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("discovery_timeout_secs", &self.discovery_timeout_secs)
            .field("streetview_timeout_secs", &self.streetview_timeout_secs)
            .field("discovery_concurrency", &self.discovery_concurrency)
            .field("discovery_jitter_min_ms", &self.discovery_jitter_min_ms)
            .field("discovery_jitter_max_ms", &self.discovery_jitter_max_ms)
            .field("discovery_result_limit", &self.discovery_result_limit)
            .finish()
    }
}
