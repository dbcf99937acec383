use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_base_url: String,
    pub ws_base_url: String,
    pub storage_path: PathBuf,
    pub page_size: i64,
    pub request_timeout_secs: u64,
}

impl StoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let ws_base_url = env::var("WS_BASE_URL")
            .unwrap_or_else(|_| derive_ws_url(&api_base_url));
        let storage_path = env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".storefront/state.json"));
        let page_size = env::var("PAGE_SIZE")
            .ok()
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(12)
            .clamp(1, 100);
        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(15);
        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            ws_base_url: ws_base_url.trim_end_matches('/').to_string(),
            storage_path,
            page_size,
            request_timeout_secs,
        })
    }
}

fn derive_ws_url(api_base_url: &str) -> String {
    if let Some(rest) = api_base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{api_base_url}")
    }
}
